//! Generic PCI definitions shared with the bus enumerator

use crate::regs::PAB_TARGET;
use core::convert::TryFrom;
use core::fmt;
use error::Errno;
use tock_registers::LocalRegisterCopy;

/// Offset of the vendor ID register
pub const PCI_VENDOR_ID: usize = 0x00;
/// Offset of the header type register
pub const PCI_HEADER_TYPE: usize = 0x0E;
/// Header type field of an ordinary (non-bridge) function
pub const PCI_HEADER_TYPE_NORMAL: u8 = 0x00;
/// Header type mask excluding the multi-function bit
pub const PCI_HEADER_TYPE_MASK: u8 = 0x7F;
/// Class/subclass code of a PCI-to-PCI bridge
pub const PCI_CLASS_BRIDGE_PCI: u32 = 0x0604;
/// Size of a function's config space
pub const PCI_CFG_SPACE_SIZE: usize = 0x1000;

/// Bus/device/function triple
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PciAddress {
    value: u32,
}

impl PciAddress {
    #[inline(always)]
    pub const fn new(bus: u8, dev: u8, func: u8) -> Self {
        Self {
            value: ((bus as u32) << 8) | (((dev & 0x1F) as u32) << 3) | ((func & 0x7) as u32),
        }
    }

    #[inline(always)]
    pub const fn bus(self) -> u8 {
        (self.value >> 8) as u8
    }

    #[inline(always)]
    pub const fn dev(self) -> u8 {
        ((self.value >> 3) as u8) & 0x1F
    }

    #[inline(always)]
    pub const fn func(self) -> u8 {
        (self.value as u8) & 0x7
    }

    #[inline(always)]
    pub const fn with_func(self, func: u8) -> Self {
        Self::new(self.bus(), self.dev(), func)
    }

    /// Packs the address into the layout of the outbound config target register
    pub fn target(self) -> u32 {
        let mut target: LocalRegisterCopy<u32, PAB_TARGET::Register> = LocalRegisterCopy::new(0);
        target.write(
            PAB_TARGET::BUS.val(self.bus() as u32)
                + PAB_TARGET::DEV.val(self.dev() as u32)
                + PAB_TARGET::FUNC.val(self.func() as u32),
        );
        target.get()
    }
}

impl fmt::Debug for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}",
            self.bus(),
            self.dev(),
            self.func()
        )
    }
}

/// Config access width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessWidth {
    Byte,
    Word,
    Dword,
}

impl AccessWidth {
    /// Width in bytes
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
        }
    }

    /// Value read back when no function responds
    pub const fn poison(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Dword => 0xFFFF_FFFF,
        }
    }
}

impl TryFrom<usize> for AccessWidth {
    type Error = Errno;

    fn try_from(bytes: usize) -> Result<Self, Errno> {
        match bytes {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Word),
            4 => Ok(Self::Dword),
            _ => Err(Errno::InvalidArgument),
        }
    }
}

/// Config-space accessor contract offered to the bus enumerator.
///
/// Accesses to functions that cannot be reached are not errors: reads
/// return the all-ones value of the access width and writes are dropped.
///
/// Width and offset are checked first, for every address: a width other
/// than 1, 2 or 4, an offset of 4096 or more, or an offset not aligned to
/// the width is rejected with [Errno::InvalidArgument], even for addresses
/// that would otherwise read as all-ones.
pub trait PciConfigAccess {
    /// Reads `size` bytes at `offset` of `addr`'s config space
    fn read_config(&self, addr: PciAddress, offset: usize, size: usize) -> Result<u32, Errno>;

    /// Writes the low `size` bytes of `value` at `offset` of `addr`'s config space
    fn write_config(
        &self,
        addr: PciAddress,
        offset: usize,
        size: usize,
        value: u32,
    ) -> Result<(), Errno>;
}
