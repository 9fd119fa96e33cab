//! CPU (AXI) side physical addresses
use core::fmt;
use core::ops::{Add, AddAssign};

/// Address as seen by the CPU and the AMBA/AXI interconnect
#[repr(transparent)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Default)]
pub struct PhysicalAddress(u64);

// Arithmetic
impl Add<u64> for PhysicalAddress {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: u64) -> Self {
        // Will panic on overflow
        Self(self.0 + rhs)
    }
}
impl AddAssign<u64> for PhysicalAddress {
    #[inline(always)]
    fn add_assign(&mut self, rhs: u64) {
        // Will panic on overflow
        self.0 += rhs;
    }
}

// Construction
impl From<u64> for PhysicalAddress {
    fn from(p: u64) -> Self {
        Self(p)
    }
}

impl From<PhysicalAddress> for u64 {
    #[inline(always)]
    fn from(p: PhysicalAddress) -> Self {
        p.0
    }
}

impl PhysicalAddress {
    /// Constructs an address from its raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value of the address
    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the low 32 bits, as written to a "lower" window register
    #[inline(always)]
    pub const fn lower(self) -> u32 {
        crate::lower_32_bits(self.0)
    }

    /// Returns the high 32 bits, as written to an "upper"/"extended" window register
    #[inline(always)]
    pub const fn upper(self) -> u32 {
        crate::upper_32_bits(self.0)
    }

    /// Adds `rhs`, returning `None` on overflow
    #[inline]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns the distance from `base` to this address, if it lies at or above `base`
    #[inline]
    pub const fn offset_from(self, base: PhysicalAddress) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

// Formatting
impl fmt::Debug for PhysicalAddress {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<phys {:#018x}>", self.0)
    }
}

impl fmt::LowerHex for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
