//! Guarded in-memory patches of the vendor RIL
//!
//! Each patch names an exported data symbol, a byte offset from it, the width
//! and byte order of the value stored there, the value the stock blob holds
//! and the value to write. A patch is written only when the stored value
//! matches the expected one; any other blob revision is left untouched.

use std::ptr::{self, NonNull};
use tuna_config::{DeviceVariant, VendorLibrary};

/// When a patch is applied relative to the vendor `RIL_Init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPhase {
    /// Before `RIL_Init`, so vendor startup never reads the bad value
    BeforeInit,
    /// After `RIL_Init`, for state the vendor initializes itself
    AfterInit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Width of a patched value in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWidth {
    U8 = 1,
    U16 = 2,
    U32 = 4,
}

impl ValueWidth {
    pub fn bytes(self) -> usize {
        self as usize
    }
}

/// One entry of the patch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchTarget {
    pub name: &'static str,
    pub symbol: &'static str,
    pub offset: usize,
    pub width: ValueWidth,
    pub endian: Endian,
    pub expected: u32,
    pub replacement: u32,
    pub phase: PatchPhase,
    /// Variants the patch applies to; empty means all
    pub variants: &'static [DeviceVariant],
}

impl PatchTarget {
    pub fn applies_to(&self, phase: PatchPhase, variant: DeviceVariant) -> bool {
        self.phase == phase && (self.variants.is_empty() || self.variants.contains(&variant))
    }

    fn encode(&self, value: u32) -> ([u8; 4], usize) {
        let n = self.width.bytes();
        let mut out = [0u8; 4];
        match self.endian {
            Endian::Little => out[..n].copy_from_slice(&value.to_le_bytes()[..n]),
            Endian::Big => out[..n].copy_from_slice(&value.to_be_bytes()[4 - n..]),
        }
        (out, n)
    }

    fn decode(&self, bytes: &[u8]) -> u32 {
        let mut word = [0u8; 4];
        match self.endian {
            Endian::Little => {
                word[..bytes.len()].copy_from_slice(bytes);
                u32::from_le_bytes(word)
            }
            Endian::Big => {
                word[4 - bytes.len()..].copy_from_slice(bytes);
                u32::from_be_bytes(word)
            }
        }
    }
}

/// `MAX_TIMEOUT` is the relative timeout of the vendor's request queue wait.
/// Bionic converts relative timeouts to absolute ones, and `0x7FFFFFFF`
/// seconds overflows that conversion; `0x01FFFFFF` (about a year) does not.
pub const MAX_TIMEOUT_PATCH: PatchTarget = PatchTarget {
    name: "max-timeout",
    symbol: "MAX_TIMEOUT",
    offset: 0,
    width: ValueWidth::U32,
    endian: Endian::Little,
    expected: 0x7FFF_FFFF,
    replacement: 0x01FF_FFFF,
    phase: PatchPhase::BeforeInit,
    variants: &[],
};

/// The maguro RIL's feature flag at `hSecOem + 0x1918` enables extra data in
/// `LAST_CALL_FAIL_CAUSE` responses that newer platforms crash on. The vendor
/// sets it inside `RIL_Init`, so it is cleared afterwards.
pub const RIL_FEATURES_PATCH: PatchTarget = PatchTarget {
    name: "ril-features",
    symbol: "hSecOem",
    offset: 0x1918,
    width: ValueWidth::U8,
    endian: Endian::Little,
    expected: 1,
    replacement: 0,
    phase: PatchPhase::AfterInit,
    variants: &[DeviceVariant::Maguro],
};

pub const PATCH_TABLE: [PatchTarget; 2] = [MAX_TIMEOUT_PATCH, RIL_FEATURES_PATCH];

/// Result of one patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// The stored value was not the expected one; nothing written
    Mismatch { found: u32 },
    SymbolMissing,
    /// Wrong phase or variant for this patch
    NotApplicable,
}

/// Resolves exported data symbols of the vendor library
///
/// # Safety
///
/// A returned address must stay valid for reads and writes of every patch
/// extent (`offset + width`) in the table it is used with.
pub unsafe trait SymbolResolver {
    fn resolve(&self, symbol: &str) -> Option<NonNull<u8>>;
}

// Safety: the vendor RIL stays mapped while the handle is open. `MAX_TIMEOUT`
// is a u32. `hSecOem` itself is smaller than the patched offset, but in the
// stock blob the writable data segment extends at least 0x1919 bytes past it,
// and the expected-value check refuses any other layout.
unsafe impl SymbolResolver for VendorLibrary {
    fn resolve(&self, symbol: &str) -> Option<NonNull<u8>> {
        self.symbol(symbol).map(NonNull::cast)
    }
}

pub struct Patcher<'a, R: SymbolResolver> {
    resolver: &'a R,
    variant: DeviceVariant,
    table: &'a [PatchTarget],
}

impl<'a, R: SymbolResolver> Patcher<'a, R> {
    pub fn new(resolver: &'a R, variant: DeviceVariant) -> Self {
        Self::with_table(resolver, variant, &PATCH_TABLE)
    }

    pub fn with_table(resolver: &'a R, variant: DeviceVariant, table: &'a [PatchTarget]) -> Self {
        Self {
            resolver,
            variant,
            table,
        }
    }

    /// Apply every patch of `phase`, reporting each outcome
    pub fn apply(&self, phase: PatchPhase) -> Vec<(&'static str, PatchOutcome)> {
        self.table
            .iter()
            .map(|target| (target.name, self.apply_one(target, phase)))
            .collect()
    }

    fn apply_one(&self, target: &PatchTarget, phase: PatchPhase) -> PatchOutcome {
        if !target.applies_to(phase, self.variant) {
            return PatchOutcome::NotApplicable;
        }

        let Some(base) = self.resolver.resolve(target.symbol) else {
            tracing::error!("{}: symbol {} could not be found", target.name, target.symbol);
            return PatchOutcome::SymbolMissing;
        };
        tracing::debug!("{}: {} found at {:p}", target.name, target.symbol, base);

        let width = target.width.bytes();
        // Safety: the resolver guarantees `offset + width` bytes from `base` are valid.
        let addr = unsafe { base.as_ptr().add(target.offset) };
        let mut current = [0u8; 4];
        // Safety: see above; vendor data carries no alignment guarantee for the offset.
        unsafe { ptr::copy_nonoverlapping(addr, current.as_mut_ptr(), width) };

        let found = target.decode(&current[..width]);
        if found != target.expected {
            tracing::warn!(
                "{}: {} is {:#x}, expected {:#x}; leaving alone",
                target.name,
                target.symbol,
                found,
                target.expected
            );
            return PatchOutcome::Mismatch { found };
        }

        let (bytes, n) = target.encode(target.replacement);
        // Safety: same extent as the read above.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), addr, n) };
        tracing::info!(
            "{}: {} changed from {:#x} to {:#x}",
            target.name,
            target.symbol,
            found,
            target.replacement
        );
        PatchOutcome::Applied
    }
}
