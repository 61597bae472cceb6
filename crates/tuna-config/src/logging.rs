//! Logging setup shared by the shims
//!
//! The shims are loaded into host processes (rild, the location service,
//! recovery) that may already have installed a subscriber, so installation is
//! best effort and happens at most once. Those processes discard stderr on a
//! device, so on Android every event is also sent to logcat.

use crate::LogConfig;
use std::io;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install `fmt` output on stderr, and on Android logcat under `tag`,
/// filtered by `RUST_LOG` or by `config.filter`
///
/// Returns `false` when a global subscriber was already set.
pub fn init_logging(tag: &str, config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(io::stderr),
    );

    #[cfg(target_os = "android")]
    let registry = {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Trace)
                .with_tag(tag),
        );
        registry.with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_level(false)
                .without_time()
                .with_writer(Logcat),
        )
    };
    #[cfg(not(target_os = "android"))]
    let _ = tag;

    registry.try_init().is_ok()
}

/// Writer factory forwarding each formatted event to the `log` backend at
/// the event's level
#[derive(Debug, Clone, Copy, Default)]
pub struct Logcat;

impl<'a> MakeWriter<'a> for Logcat {
    type Writer = LogcatLine;

    fn make_writer(&'a self) -> Self::Writer {
        LogcatLine::new(log::Level::Info)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LogcatLine::new(log_level(meta.level()))
    }
}

fn log_level(level: &Level) -> log::Level {
    match *level {
        Level::ERROR => log::Level::Error,
        Level::WARN => log::Level::Warn,
        Level::INFO => log::Level::Info,
        Level::DEBUG => log::Level::Debug,
        Level::TRACE => log::Level::Trace,
    }
}

/// One event's text, emitted as a single record when dropped
#[derive(Debug)]
pub struct LogcatLine {
    level: log::Level,
    buf: Vec<u8>,
}

impl LogcatLine {
    fn new(level: log::Level) -> Self {
        Self {
            level,
            buf: Vec::new(),
        }
    }
}

impl io::Write for LogcatLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogcatLine {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if !line.is_empty() {
            log::log!(self.level, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    static RECORDS: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            RECORDS
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger;

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LogConfig::default();
        let _ = init_logging("tuna-test", &config);
        // A subscriber is installed now, whoever installed it
        assert!(!init_logging("tuna-test", &config));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(log_level(&Level::ERROR), log::Level::Error);
        assert_eq!(log_level(&Level::WARN), log::Level::Warn);
        assert_eq!(log_level(&Level::INFO), log::Level::Info);
        assert_eq!(log_level(&Level::DEBUG), log::Level::Debug);
        assert_eq!(log_level(&Level::TRACE), log::Level::Trace);
    }

    #[test]
    fn test_logcat_line_emits_one_record_per_event() {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        {
            let mut line = LogcatLine::new(log::Level::Warn);
            write!(line, "tuna_ril_shim::patch: ").unwrap();
            write!(line, "hSecOem+0x1918 holds 2, leaving it\n").unwrap();
        }
        // Nothing but a newline is not worth a record
        drop(LogcatLine::new(log::Level::Info));
        {
            let mut line = Logcat.make_writer();
            line.write_all(b"RIL_Init failed\n").unwrap();
        }

        let records = RECORDS.lock().unwrap();
        assert_eq!(
            *records,
            vec![
                (
                    log::Level::Warn,
                    "tuna_ril_shim::patch: hSecOem+0x1918 holds 2, leaving it".to_string()
                ),
                (log::Level::Info, "RIL_Init failed".to_string()),
            ]
        );
    }
}
