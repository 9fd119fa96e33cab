//! Type-safe wrappers for the two address domains a PCIe controller bridges
#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

#[deny(missing_docs)]
pub mod phys;
#[deny(missing_docs)]
pub mod bus;

pub use bus::BusAddress;
pub use phys::PhysicalAddress;

/// Returns the low 32 bits of `v`
#[inline(always)]
pub const fn lower_32_bits(v: u64) -> u32 {
    v as u32
}

/// Returns the high 32 bits of `v`
#[inline(always)]
pub const fn upper_32_bits(v: u64) -> u32 {
    (v >> 32) as u32
}

/// Joins a `(low, high)` register pair back into a 64-bit value
#[inline(always)]
pub const fn join_32_bits(low: u32, high: u32) -> u64 {
    (low as u64) | ((high as u64) << 32)
}
