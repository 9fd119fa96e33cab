//! Paged access to the control/status register block
//!
//! Only the first 3 KiB of the CCSR block are directly visible. The last
//! KiB of the aperture is a window onto one of 64 pages selected by
//! `PAB_CTRL[PAGE_SEL]`, which is how the remaining registers (and the
//! upper part of the controller's own config space) are reached.

use crate::io::{Bank, RegisterSpace};
use crate::regs::{self, PAB_CTRL_REG};
use tock_registers::LocalRegisterCopy;

/// Page selector and page-relative address for a logical CCSR offset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagedOffset {
    /// Value for `PAB_CTRL[PAGE_SEL]`
    pub page: u32,
    /// Offset into the CCSR aperture
    pub addr: usize,
}

impl PagedOffset {
    /// Splits a logical offset into page index and aperture address
    pub const fn new(off: usize) -> Self {
        if off < regs::INDIRECT_ADDR_BNDRY {
            Self { page: 0, addr: off }
        } else {
            Self {
                page: ((off >> regs::PAGE_IDX_SHIFT) & regs::PAGE_SEL_MASK) as u32,
                addr: (off & regs::PAGE_ADDR_MASK) | regs::INDIRECT_ADDR_BNDRY,
            }
        }
    }
}

/// CCSR bank with transparent page selection
pub struct Ccsr<S> {
    bank: Bank<S>,
}

impl<S: RegisterSpace> Ccsr<S> {
    /// Wraps a CCSR register bank
    pub const fn new(bank: Bank<S>) -> Self {
        Self { bank }
    }

    /// Returns the underlying bank
    #[inline(always)]
    pub fn bank(&self) -> &Bank<S> {
        &self.bank
    }

    /// Selects CCSR page `page`
    pub fn set_page(&self, page: u32) {
        let mut ctrl: LocalRegisterCopy<u32, PAB_CTRL_REG::Register> =
            LocalRegisterCopy::new(self.bank.readl(regs::PAB_CTRL));
        ctrl.modify(PAB_CTRL_REG::PAGE_SEL.val(page));
        self.bank.writel(regs::PAB_CTRL, ctrl.get());
    }

    /// Selects the page `off` lives in and returns its aperture address
    pub fn select(&self, off: usize) -> usize {
        let paged = PagedOffset::new(off);
        self.set_page(paged.page);
        paged.addr
    }

    /// Reads register at logical offset `off`
    pub fn readl(&self, off: usize) -> u32 {
        let addr = self.select(off);
        self.bank.readl(addr)
    }

    /// Writes register at logical offset `off`
    pub fn writel(&self, off: usize, val: u32) {
        let addr = self.select(off);
        self.bank.writel(addr, val);
    }

    /// Read-modify-write of register at logical offset `off`
    pub fn modify<F: FnOnce(u32) -> u32>(&self, off: usize, f: F) {
        let val = self.readl(off);
        self.writel(off, f(val));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSpace;

    #[test]
    fn paged_offset_split() {
        assert_eq!(PagedOffset::new(0x0E), PagedOffset { page: 0, addr: 0x0E });
        assert_eq!(PagedOffset::new(0xBFC), PagedOffset { page: 0, addr: 0xBFC });
        assert_eq!(PagedOffset::new(0xC00), PagedOffset { page: 3, addr: 0xC00 });
        assert_eq!(PagedOffset::new(0x100), PagedOffset { page: 0, addr: 0x100 });
        // PAB_EXT_AXI_AMAP_SIZE(0)
        assert_eq!(PagedOffset::new(0xBAF0), PagedOffset { page: 0x2E, addr: 0xEF0 });
        // PAB_PEX_AMAP_CTRL(0)
        assert_eq!(PagedOffset::new(0x4BA0), PagedOffset { page: 0x12, addr: 0xFA0 });
    }

    #[test]
    fn page_select_preserves_ctrl() {
        let fake = FakeSpace::paged(0x10000);
        fake.poke32(regs::PAB_CTRL, 0x3);
        let ccsr = Ccsr::new(Bank::new(&fake, false));

        ccsr.writel(0xBAF0, 0xFFFF_FFFF);
        assert_eq!(fake.peek32(regs::PAB_CTRL), 0x3 | (0x2E << 13));
        assert_eq!(fake.peek32(0xBAF0), 0xFFFF_FFFF);

        ccsr.writel(0x4BA0, 0x7);
        assert_eq!(fake.peek32(0x4BA0), 0x7);
        assert_eq!(fake.peek32(0xBAF0), 0xFFFF_FFFF);

        assert_eq!(ccsr.readl(0xBAF0), 0xFFFF_FFFF);
        assert_eq!(ccsr.readl(0x474), 0);
        assert_eq!(fake.peek32(regs::PAB_CTRL), 0x3);
    }
}
