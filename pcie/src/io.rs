//! Register space access
//!
//! [RegisterSpace] is the only way the driver touches hardware. Real
//! hardware is reached through [Mmio]; [Bank] adds the per-controller
//! endianness on top of any space.

use core::ptr::{read_volatile, write_volatile};

cfg_if::cfg_if! {
    if #[cfg(target_arch = "aarch64")] {
        use cortex_a::asm::barrier;

        #[inline(always)]
        fn store_barrier() {
            barrier::dmb(barrier::SY);
        }
    } else {
        #[inline(always)]
        fn store_barrier() {
            core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
        }
    }
}

/// Width-sized register access at a byte offset into some register window
pub trait RegisterSpace {
    /// Size of the window in bytes
    fn size(&self) -> usize;

    /// Reads a byte at `off`
    fn read8(&self, off: usize) -> u8;
    /// Reads a halfword at `off`, in native byte order
    fn read16(&self, off: usize) -> u16;
    /// Reads a word at `off`, in native byte order
    fn read32(&self, off: usize) -> u32;

    /// Writes a byte at `off`
    fn write8(&self, off: usize, val: u8);
    /// Writes a halfword at `off`, in native byte order
    fn write16(&self, off: usize, val: u16);
    /// Writes a word at `off`, in native byte order
    fn write32(&self, off: usize, val: u32);
}

impl<T: RegisterSpace + ?Sized> RegisterSpace for &T {
    #[inline(always)]
    fn size(&self) -> usize {
        (**self).size()
    }

    #[inline(always)]
    fn read8(&self, off: usize) -> u8 {
        (**self).read8(off)
    }

    #[inline(always)]
    fn read16(&self, off: usize) -> u16 {
        (**self).read16(off)
    }

    #[inline(always)]
    fn read32(&self, off: usize) -> u32 {
        (**self).read32(off)
    }

    #[inline(always)]
    fn write8(&self, off: usize, val: u8) {
        (**self).write8(off, val)
    }

    #[inline(always)]
    fn write16(&self, off: usize, val: u16) {
        (**self).write16(off, val)
    }

    #[inline(always)]
    fn write32(&self, off: usize, val: u32) {
        (**self).write32(off, val)
    }
}

/// Memory-mapped register window. Boot stages run with an identity
/// mapping of device memory, so `base` is both physical and virtual.
#[derive(Debug)]
pub struct Mmio {
    name: &'static str,
    base: usize,
    size: usize,
}

impl Mmio {
    /// Constructs a register window over `base..base + size`.
    ///
    /// # Safety
    ///
    /// Does not perform `base` validation: the range must be mapped as
    /// device memory and must not be aliased by another [Mmio].
    pub const unsafe fn new(name: &'static str, base: usize, size: usize) -> Self {
        Self { name, base, size }
    }

    /// Returns the name given to this window
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the base address of this window
    pub const fn base(&self) -> usize {
        self.base
    }

    #[inline(always)]
    fn ptr(&self, off: usize, width: usize) -> usize {
        assert!(off & (width - 1) == 0, "{}: misaligned access at {:#x}", self.name, off);
        assert!(off + width <= self.size, "{}: access at {:#x} out of bounds", self.name, off);
        self.base + off
    }
}

impl RegisterSpace for Mmio {
    fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    fn read8(&self, off: usize) -> u8 {
        unsafe { read_volatile(self.ptr(off, 1) as *const u8) }
    }

    #[inline(always)]
    fn read16(&self, off: usize) -> u16 {
        unsafe { read_volatile(self.ptr(off, 2) as *const u16) }
    }

    #[inline(always)]
    fn read32(&self, off: usize) -> u32 {
        unsafe { read_volatile(self.ptr(off, 4) as *const u32) }
    }

    #[inline(always)]
    fn write8(&self, off: usize, val: u8) {
        let ptr = self.ptr(off, 1);
        store_barrier();
        unsafe { write_volatile(ptr as *mut u8, val) }
    }

    #[inline(always)]
    fn write16(&self, off: usize, val: u16) {
        let ptr = self.ptr(off, 2);
        store_barrier();
        unsafe { write_volatile(ptr as *mut u16, val) }
    }

    #[inline(always)]
    fn write32(&self, off: usize, val: u32) {
        let ptr = self.ptr(off, 4);
        store_barrier();
        unsafe { write_volatile(ptr as *mut u32, val) }
    }
}

/// Control register bank: 32-bit registers in the byte order the controller
/// was strapped for
pub struct Bank<S> {
    io: S,
    big_endian: bool,
}

impl<S: RegisterSpace> Bank<S> {
    /// Wraps `io`, whose registers are big-endian if `big_endian` is set
    pub const fn new(io: S, big_endian: bool) -> Self {
        Self { io, big_endian }
    }

    /// Returns `true` if the registers of this bank are big-endian
    pub const fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// Returns the underlying register space for raw (byte-order preserving) access
    #[inline(always)]
    pub fn io(&self) -> &S {
        &self.io
    }

    /// Reads register at `off`
    #[inline]
    pub fn readl(&self, off: usize) -> u32 {
        let raw = self.io.read32(off);
        if self.big_endian {
            u32::from_be(raw)
        } else {
            u32::from_le(raw)
        }
    }

    /// Writes `val` to register at `off`
    #[inline]
    pub fn writel(&self, off: usize, val: u32) {
        let raw = if self.big_endian {
            val.to_be()
        } else {
            val.to_le()
        };
        self.io.write32(off, raw);
    }

    /// Read-modify-write of register at `off`
    #[inline]
    pub fn modify<F: FnOnce(u32) -> u32>(&self, off: usize, f: F) {
        let val = self.readl(off);
        self.writel(off, f(val));
    }
}
