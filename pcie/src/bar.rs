//! Endpoint BAR sizing
//!
//! In Endpoint mode the controller emulates its own type 0 header. BAR
//! sizes are programmed through an indexed register pair: select the BAR,
//! then write the size mask. The last two BAR slots are 64-bit and take
//! the upper mask word as well.

use crate::ccsr::Ccsr;
use crate::io::RegisterSpace;
use crate::regs;
use crate::window::WindowSize;
use error::Errno;

/// Smallest BAR the hardware can decode
pub const BAR_MIN_SIZE: u64 = 4 << 10;
/// Number of programmable BAR slots
pub const BAR_COUNT: usize = 4;

const BAR_ENABLE_ALL: u32 = 0xF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarWidth {
    Bits32,
    Bits64,
}

/// Validated BAR slot and size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarDescriptor {
    bar: usize,
    size: WindowSize,
}

impl BarDescriptor {
    pub fn new(bar: usize, size: u64) -> Result<Self, Errno> {
        if bar >= BAR_COUNT {
            warnln!("Invalid BAR: {}", bar);
            return Err(Errno::InvalidArgument);
        }
        if size < BAR_MIN_SIZE {
            warnln!("BAR{}: size {:#x} below {:#x}", bar, size, BAR_MIN_SIZE);
            return Err(Errno::InvalidArgument);
        }
        let size = WindowSize::new(size)?;
        Ok(Self { bar, size })
    }

    #[inline]
    pub const fn bar(&self) -> usize {
        self.bar
    }

    #[inline]
    pub const fn size(&self) -> WindowSize {
        self.size
    }

    pub const fn width(&self) -> BarWidth {
        if self.bar < 2 {
            BarWidth::Bits32
        } else {
            BarWidth::Bits64
        }
    }
}

impl<S: RegisterSpace> Ccsr<S> {
    /// Programs the size of one BAR, enabling all BARs first if needed
    pub fn setup_bar(&self, desc: &BarDescriptor) {
        if self.readl(regs::GPEX_BAR_ENABLE) & BAR_ENABLE_ALL != BAR_ENABLE_ALL {
            self.writel(regs::GPEX_BAR_ENABLE, BAR_ENABLE_ALL);
        }

        self.writel(regs::GPEX_BAR_SELECT, desc.bar as u32);
        self.writel(regs::GPEX_BAR_SIZE_LDW, desc.size.mask_low());
        if desc.width() == BarWidth::Bits64 {
            self.writel(regs::GPEX_BAR_SIZE_UDW, desc.size.mask_high());
        }
    }
}
