//! PCIe bus side addresses
use core::fmt;
use core::ops::Add;

/// Address as seen on the PCIe link, i.e. the value carried in TLPs
#[repr(transparent)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Default)]
pub struct BusAddress(u64);

impl Add<u64> for BusAddress {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: u64) -> Self {
        // Will panic on overflow
        Self(self.0 + rhs)
    }
}

impl From<u64> for BusAddress {
    fn from(p: u64) -> Self {
        Self(p)
    }
}

impl From<BusAddress> for u64 {
    #[inline(always)]
    fn from(p: BusAddress) -> Self {
        p.0
    }
}

impl BusAddress {
    /// Bus address zero, the base of the catch-all inbound window
    pub const ZERO: Self = Self(0);

    /// Constructs an address from its raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value of the address
    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the low 32 bits of the address
    #[inline(always)]
    pub const fn lower(self) -> u32 {
        crate::lower_32_bits(self.0)
    }

    /// Returns the high 32 bits of the address
    #[inline(always)]
    pub const fn upper(self) -> u32 {
        crate::upper_32_bits(self.0)
    }
}

impl fmt::Debug for BusAddress {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<bus {:#018x}>", self.0)
    }
}
