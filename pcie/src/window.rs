//! Address translation window table
//!
//! Outbound windows translate AXI addresses into PCIe bus addresses
//! (memory, IO and config cycles issued by the CPU). Inbound windows do the
//! reverse for requests arriving from the link. Window sizes are encoded as
//! `!(size - 1)`, split into a control-register size field (bits 31:10 of
//! the low word) and an extended register holding the high word.

use crate::ccsr::Ccsr;
use crate::io::RegisterSpace;
use crate::regs::{self, AXI_AMAP_CTRL, PEX_AMAP_CTRL};
use address::{join_32_bits, lower_32_bits, upper_32_bits, BusAddress, PhysicalAddress};
use enum_repr::EnumRepr;
use error::Errno;
use tock_registers::LocalRegisterCopy;

/// Transaction type issued through an outbound window
#[EnumRepr(type = "u32")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutboundType {
    Config = 0,
    Io = 1,
    Memory = 2,
    Atomic = 3,
}

/// Access type accepted by an inbound window
#[EnumRepr(type = "u32")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InboundType {
    Memory = 2,
    MemoryNoFetch = 3,
}

/// Smallest size an address translation window can have
pub const WINDOW_MIN_SIZE: u64 = 1 << 10;

/// Power-of-two window size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize(u64);

impl WindowSize {
    /// Checks that `size` can be expressed as a size mask
    pub const fn new(size: u64) -> Result<Self, Errno> {
        if size.is_power_of_two() {
            Ok(Self(size))
        } else {
            Err(Errno::InvalidArgument)
        }
    }

    /// Checks that `size` can be programmed into a window: the control
    /// register size field starts at bit 10, so smaller windows cannot be
    /// expressed
    pub const fn for_window(size: u64) -> Result<Self, Errno> {
        if size < WINDOW_MIN_SIZE {
            return Err(Errno::InvalidArgument);
        }
        Self::new(size)
    }

    /// Recovers the size from a `(low, high)` mask pair
    pub const fn from_mask(low: u32, high: u32) -> Option<Self> {
        let size = (!join_32_bits(low, high)).wrapping_add(1);
        if size.is_power_of_two() {
            Some(Self(size))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// `!(size - 1)`, the value the hardware compares addresses against
    #[inline(always)]
    pub const fn mask(self) -> u64 {
        !(self.0 - 1)
    }

    #[inline(always)]
    pub const fn mask_low(self) -> u32 {
        lower_32_bits(self.mask())
    }

    #[inline(always)]
    pub const fn mask_high(self) -> u32 {
        upper_32_bits(self.mask())
    }
}

/// Read-back of one outbound window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutboundWindowInfo {
    pub index: usize,
    pub phys: PhysicalAddress,
    pub bus: BusAddress,
    /// Size field of the control register, in place
    pub size: u32,
    pub ext_size: u32,
    pub ctrl: u32,
}

impl OutboundWindowInfo {
    pub fn is_enabled(&self) -> bool {
        LocalRegisterCopy::<u32, AXI_AMAP_CTRL::Register>::new(self.ctrl).is_set(AXI_AMAP_CTRL::EN)
    }

    pub fn kind(&self) -> Option<OutboundType> {
        let ctrl: LocalRegisterCopy<u32, AXI_AMAP_CTRL::Register> = LocalRegisterCopy::new(self.ctrl);
        OutboundType::from_repr(ctrl.read(AXI_AMAP_CTRL::TYPE))
    }

    pub fn window_size(&self) -> Option<WindowSize> {
        WindowSize::from_mask(self.size, self.ext_size)
    }
}

impl<S: RegisterSpace> Ccsr<S> {
    /// Programs outbound window `idx` to forward `size` bytes at `phys` to
    /// `bus` on the link, issuing `ty` transactions.
    ///
    /// Nothing is written if `idx` or `size` is rejected.
    pub fn set_outbound_window(
        &self,
        idx: usize,
        ty: OutboundType,
        phys: PhysicalAddress,
        bus: BusAddress,
        size: u64,
    ) -> Result<(), Errno> {
        if idx >= regs::PAB_WINS_NUM {
            return Err(Errno::OutOfRange);
        }
        let size = WindowSize::for_window(size)?;

        debugln!(
            "APIO win{}: {:?} {:?} -> {:?}, size {:#x}",
            idx,
            ty,
            phys,
            bus,
            size.get()
        );

        self.writel(regs::pab_axi_amap_axi_win(idx), phys.lower());
        self.writel(regs::pab_ext_axi_amap_axi_win(idx), phys.upper());
        self.writel(regs::pab_axi_amap_pex_win_l(idx), bus.lower());
        self.writel(regs::pab_axi_amap_pex_win_h(idx), bus.upper());
        self.writel(regs::pab_ext_axi_amap_size(idx), size.mask_high());

        let mut ctrl: LocalRegisterCopy<u32, AXI_AMAP_CTRL::Register> =
            LocalRegisterCopy::new(self.readl(regs::pab_axi_amap_ctrl(idx)));
        ctrl.modify(
            AXI_AMAP_CTRL::TYPE.val(ty.repr())
                + AXI_AMAP_CTRL::SIZE.val(size.mask_low() >> 10)
                + AXI_AMAP_CTRL::EN::SET,
        );
        self.writel(regs::pab_axi_amap_ctrl(idx), ctrl.get());

        Ok(())
    }

    /// Programs inbound window `idx` (Root Complex mode) to forward `size`
    /// bytes at `bus` on the link to `phys`.
    ///
    /// Nothing is written if `idx` or `size` is rejected.
    pub fn set_inbound_window(
        &self,
        idx: usize,
        ty: InboundType,
        phys: PhysicalAddress,
        bus: BusAddress,
        size: u64,
    ) -> Result<(), Errno> {
        if idx >= regs::PAB_PEX_WINS_NUM {
            return Err(Errno::OutOfRange);
        }
        let size = WindowSize::for_window(size)?;

        debugln!(
            "PPIO win{}: {:?} {:?} -> {:?}, size {:#x}",
            idx,
            ty,
            bus,
            phys,
            size.get()
        );

        let mut ctrl: LocalRegisterCopy<u32, PEX_AMAP_CTRL::Register> =
            LocalRegisterCopy::new(self.readl(regs::pab_pex_amap_ctrl(idx)));
        ctrl.modify(
            PEX_AMAP_CTRL::TYPE.val(ty.repr())
                + PEX_AMAP_CTRL::SIZE.val(size.mask_low() >> 10)
                + PEX_AMAP_CTRL::EN::SET,
        );
        self.writel(regs::pab_pex_amap_ctrl(idx), ctrl.get());

        self.writel(regs::pab_ext_pex_amap_size(idx), size.mask_high());
        self.writel(regs::pab_pex_amap_axi_win(idx), phys.lower());
        self.writel(regs::pab_ext_pex_amap_axi_win(idx), phys.upper());
        self.writel(regs::pab_pex_amap_pex_win_l(idx), bus.lower());
        self.writel(regs::pab_pex_amap_pex_win_h(idx), bus.upper());

        Ok(())
    }

    /// Maps BAR `bar` of physical function `func` (Endpoint mode) onto
    /// local memory at `phys`
    pub fn set_bar_inbound_window(
        &self,
        func: usize,
        bar: usize,
        phys: PhysicalAddress,
    ) -> Result<(), Errno> {
        if bar > 3 {
            return Err(Errno::InvalidArgument);
        }

        debugln!("PF{} BAR{} -> {:?}", func, bar, phys);

        self.writel(regs::pab_ext_pex_bar_amap(func, bar), phys.upper());
        self.writel(regs::pab_pex_bar_amap(func, bar), phys.lower() | regs::BAR_AMAP_EN);
        Ok(())
    }

    /// Reads back outbound window `idx`
    pub fn outbound_window(&self, idx: usize) -> Result<OutboundWindowInfo, Errno> {
        if idx >= regs::PAB_WINS_NUM {
            return Err(Errno::OutOfRange);
        }

        let ctrl = self.readl(regs::pab_axi_amap_ctrl(idx));
        let size_mask = AXI_AMAP_CTRL::SIZE.mask << AXI_AMAP_CTRL::SIZE.shift;
        Ok(OutboundWindowInfo {
            index: idx,
            phys: PhysicalAddress::new(join_32_bits(
                self.readl(regs::pab_axi_amap_axi_win(idx)),
                self.readl(regs::pab_ext_axi_amap_axi_win(idx)),
            )),
            bus: BusAddress::new(join_32_bits(
                self.readl(regs::pab_axi_amap_pex_win_l(idx)),
                self.readl(regs::pab_axi_amap_pex_win_h(idx)),
            )),
            size: ctrl & size_mask,
            ext_size: self.readl(regs::pab_ext_axi_amap_size(idx)),
            ctrl,
        })
    }

    /// Logs the first `count` outbound windows
    pub fn dump_windows(&self, count: usize) {
        for idx in 0..count.min(regs::PAB_WINS_NUM) {
            if let Ok(win) = self.outbound_window(idx) {
                debugln!("APIO Win{}:", idx);
                debugln!("\tLOWER PHYS:\t{:#010x}", win.phys.lower());
                debugln!("\tUPPER PHYS:\t{:#010x}", win.phys.upper());
                debugln!("\tLOWER BUS:\t{:#010x}", win.bus.lower());
                debugln!("\tUPPER BUS:\t{:#010x}", win.bus.upper());
                debugln!("\tSIZE:\t\t{:#010x}", win.size);
                debugln!("\tEXT_SIZE:\t{:#010x}", win.ext_size);
                debugln!("\tCTRL:\t\t{:#010x}", win.ctrl);
            }
        }
    }
}
