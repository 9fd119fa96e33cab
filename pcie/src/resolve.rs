//! Config-space address resolution
//!
//! The controller's own header lives inside the CCSR block and is reached
//! through the paged aperture. Any other function is reached through the
//! config window: outbound window 0 is retargeted at the function's
//! bus/device/function before each access.

use crate::controller::Banks;
use crate::io::RegisterSpace;
use crate::pci::{AccessWidth, PciAddress};
use crate::regs::{self, LUT_GCR};
use tock_registers::LocalRegisterCopy;

/// Location a config access resolved to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigTarget {
    /// Aperture address inside the CCSR block, page already selected
    Local(usize),
    /// Offset inside the config window, target already programmed
    Remote(usize),
}

impl<S: RegisterSpace> Banks<S> {
    /// Resolves `offset` of function `addr` and prepares the hardware for
    /// the access
    pub fn resolve(&self, own_bus: u8, addr: PciAddress, offset: usize) -> ConfigTarget {
        if addr.bus() == own_bus {
            ConfigTarget::Local(self.ccsr.select(offset))
        } else {
            self.ccsr.writel(regs::pab_axi_amap_pex_win_l(0), addr.target());
            self.ccsr.writel(regs::pab_axi_amap_pex_win_h(0), 0);
            ConfigTarget::Remote(offset)
        }
    }

    fn space(&self, target: ConfigTarget) -> (&S, usize) {
        match target {
            ConfigTarget::Local(addr) => (self.ccsr.bank().io(), addr),
            ConfigTarget::Remote(off) => (&self.cfg, off),
        }
    }

    /// Config space is little-endian regardless of the register banks
    pub fn read(&self, target: ConfigTarget, width: AccessWidth) -> u32 {
        let (io, off) = self.space(target);
        match width {
            AccessWidth::Byte => io.read8(off) as u32,
            AccessWidth::Word => u16::from_le(io.read16(off)) as u32,
            AccessWidth::Dword => u32::from_le(io.read32(off)),
        }
    }

    pub fn write(&self, target: ConfigTarget, width: AccessWidth, value: u32) {
        let (io, off) = self.space(target);
        match width {
            AccessWidth::Byte => io.write8(off, value as u8),
            AccessWidth::Word => io.write16(off, (value as u16).to_le()),
            AccessWidth::Dword => io.write32(off, value.to_le()),
        }
    }

    /// Reads the controller's own config header
    pub fn read_own(&self, offset: usize, width: AccessWidth) -> u32 {
        let target = ConfigTarget::Local(self.ccsr.select(offset));
        self.read(target, width)
    }

    /// Sets or clears completion retry response in the lookup table
    pub fn set_retry_response(&self, enable: bool) {
        self.lut.modify(regs::PCIE_LUT_GCR, |val| {
            let mut gcr: LocalRegisterCopy<u32, LUT_GCR::Register> = LocalRegisterCopy::new(val);
            if enable {
                gcr.modify(LUT_GCR::RRE::SET);
            } else {
                gcr.modify(LUT_GCR::RRE::CLEAR);
            }
            gcr.get()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::Board;
    use crate::platform::Regions;

    fn banks(board: &Board) -> Banks<&crate::fake::FakeSpace> {
        let res = board.resources(1, Regions::default());
        Banks::new(
            res.ccsr.unwrap(),
            res.config.unwrap(),
            res.lut.unwrap(),
            res.pf_ctrl.unwrap(),
            false,
        )
    }

    #[test]
    fn own_bus_goes_through_ccsr() {
        let board = Board::new();
        board.ccsr.poke32(0x10, 0xDEAD_BEEF);
        let banks = banks(&board);

        let target = banks.resolve(1, PciAddress::new(1, 0, 0), 0x10);
        assert_eq!(target, ConfigTarget::Local(0x10));
        assert_eq!(banks.read(target, AccessWidth::Dword), 0xDEAD_BEEF);
        assert_eq!(banks.read(target, AccessWidth::Word), 0xBEEF);
        assert_eq!(board.cfg.read_count(), 0);
    }

    #[test]
    fn own_bus_high_offset_selects_page() {
        let board = Board::new();
        // Offset 0xD00 lives on page 3 at aperture 0xD00
        board.ccsr.poke32(0xD00, 0x1234_5678);
        let banks = banks(&board);

        let target = banks.resolve(1, PciAddress::new(1, 0, 0), 0xD00);
        assert_eq!(target, ConfigTarget::Local(0xD00));
        assert_eq!((board.ccsr.peek32(regs::PAB_CTRL) >> 13) & 0x3F, 3);
        assert_eq!(banks.read(target, AccessWidth::Dword), 0x1234_5678);
    }

    #[test]
    fn other_bus_programs_target() {
        let board = Board::new();
        board.cfg.poke32(0x08, 0x0604_0001);
        let banks = banks(&board);

        let target = banks.resolve(1, PciAddress::new(2, 0, 0), 0x08);
        assert_eq!(target, ConfigTarget::Remote(0x08));
        assert_eq!(board.ccsr.peek32(regs::pab_axi_amap_pex_win_l(0)), 0x0200_0000);
        assert_eq!(board.ccsr.peek32(regs::pab_axi_amap_pex_win_h(0)), 0);
        assert_eq!(banks.read(target, AccessWidth::Dword), 0x0604_0001);

        banks.resolve(1, PciAddress::new(5, 3, 2), 0);
        assert_eq!(
            board.ccsr.peek32(regs::pab_axi_amap_pex_win_l(0)),
            5 << 24 | 3 << 19 | 2 << 16
        );
    }

    #[test]
    fn writes_are_width_sized() {
        let board = Board::new();
        let banks = banks(&board);

        banks.write(ConfigTarget::Remote(0x3C), AccessWidth::Byte, 0x1FF);
        assert_eq!(board.cfg.bytes(0x3C, 4), [0xFF, 0, 0, 0]);
        banks.write(ConfigTarget::Remote(0x04), AccessWidth::Word, 0xABCD_0146);
        assert_eq!(board.cfg.bytes(0x04, 4), [0x46, 0x01, 0, 0]);
    }

    #[test]
    fn retry_response_toggle_keeps_other_bits() {
        let board = Board::new();
        board.lut.poke32(regs::PCIE_LUT_GCR, 0x8000_0001);
        let banks = banks(&board);

        banks.set_retry_response(false);
        assert_eq!(board.lut.peek32(regs::PCIE_LUT_GCR), 0x8000_0000);
        banks.set_retry_response(true);
        assert_eq!(board.lut.peek32(regs::PCIE_LUT_GCR), 0x8000_0001);
    }
}
