//! Controller bring-up
//!
//! The controller's own header type, as strapped by the reset
//! configuration, decides its role: a type 0 header means Endpoint,
//! anything else Root Complex.

use crate::bar::{BarDescriptor, BAR_COUNT};
use crate::config::Config;
use crate::controller::{Banks, LxPcie, State};
use crate::io::RegisterSpace;
use crate::link;
use crate::pci::{
    AccessWidth, PCI_CLASS_BRIDGE_PCI, PCI_HEADER_TYPE, PCI_HEADER_TYPE_MASK, PCI_HEADER_TYPE_NORMAL,
};
use crate::platform::{MappedResource, PlatformResources, Regions, Resource};
use crate::regs::{self, AxiPioCtrl, PexPioCtrl, GPEX_CLASSCODE_REG, PAB_CTRL_REG};
use crate::sync::SpinLock;
use crate::window::{InboundType, OutboundType, WindowSize};
use address::{BusAddress, PhysicalAddress};
use error::Errno;
use tock_registers::LocalRegisterCopy;

/// Controller role
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    RootComplex,
    Endpoint,
}

impl Mode {
    /// Derives the role from the controller's own header type register
    pub const fn from_header_type(header_type: u8) -> Self {
        if header_type & PCI_HEADER_TYPE_MASK == PCI_HEADER_TYPE_NORMAL {
            Self::Endpoint
        } else {
            Self::RootComplex
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RootComplex => "Root Complex",
            Self::Endpoint => "Endpoint",
        }
    }
}

fn required<S>(
    idx: usize,
    name: &str,
    res: Option<MappedResource<S>>,
) -> Result<MappedResource<S>, Errno> {
    res.ok_or_else(|| {
        errorln!("PCIe{}: resource {:?} not found", idx, name);
        Errno::DoesNotExist
    })
}

fn set_bits<S: RegisterSpace>(banks: &Banks<S>, off: usize, bits: u32) {
    banks.ccsr.modify(off, |val| val | bits);
}

/// Root Complex windows: a catch-all inbound window, the config window and
/// one outbound window per forwarded region. Returns the number of
/// outbound windows programmed.
fn setup_rc_windows<S: RegisterSpace>(
    banks: &Banks<S>,
    cfg: &Resource,
    regions: &Regions,
    config: &Config,
) -> Result<usize, Errno> {
    let ccsr = &banks.ccsr;

    ccsr.set_inbound_window(
        0,
        InboundType::MemoryNoFetch,
        PhysicalAddress::new(0),
        BusAddress::ZERO,
        config.rc_inbound_size(),
    )?;
    ccsr.set_outbound_window(0, OutboundType::Config, cfg.start, BusAddress::ZERO, cfg.size)?;

    let mut idx = 1;
    for (ty, region) in [
        (OutboundType::Io, regions.io),
        (OutboundType::Memory, regions.mem),
        (OutboundType::Memory, regions.pref),
    ] {
        if let Some(region) = region {
            ccsr.set_outbound_window(idx, ty, region.phys_start, region.bus_start, region.size)?;
            idx += 1;
        }
    }

    ccsr.dump_windows(idx);
    Ok(idx)
}

fn setup_rc<S: RegisterSpace>(
    banks: &Banks<S>,
    cfg: &Resource,
    regions: &Regions,
    config: &Config,
) -> Result<usize, Errno> {
    banks.ccsr.modify(regs::GPEX_CLASSCODE, |val| {
        let mut reg: LocalRegisterCopy<u32, GPEX_CLASSCODE_REG::Register> =
            LocalRegisterCopy::new(val);
        reg.modify(GPEX_CLASSCODE_REG::CLASSCODE.val(PCI_CLASS_BRIDGE_PCI));
        reg.get()
    });

    set_bits(
        banks,
        regs::pab_axi_pio_ctrl(0),
        (AxiPioCtrl::APIO_EN
            | AxiPioCtrl::MEM_WIN_EN
            | AxiPioCtrl::IO_WIN_EN
            | AxiPioCtrl::CFG_WIN_EN)
            .bits(),
    );

    setup_rc_windows(banks, cfg, regions, config)
}

/// Endpoint BARs and the local memory backing them, checked as a whole
/// before anything is programmed
struct EpLayout {
    bars: [BarDescriptor; BAR_COUNT],
    backing: [PhysicalAddress; BAR_COUNT],
    outbound: WindowSize,
}

impl EpLayout {
    fn new(config: &Config) -> Result<Self, Errno> {
        let sizes = config.ep_bar_sizes();
        let bars = [
            BarDescriptor::new(0, sizes[0])?,
            BarDescriptor::new(1, sizes[1])?,
            BarDescriptor::new(2, sizes[2])?,
            BarDescriptor::new(3, sizes[3])?,
        ];

        let overflow = || {
            warnln!("EP memory at {:#x} overflows", config.ep_memory_base());
            Errno::InvalidArgument
        };
        let base = PhysicalAddress::new(config.ep_memory_base());
        let bar1 = base.checked_add(sizes[1]).ok_or_else(overflow)?;
        let bar2 = bar1.checked_add(sizes[2]).ok_or_else(overflow)?;
        let bar3 = base.checked_add(sizes[3]).ok_or_else(overflow)?;

        Ok(Self {
            bars,
            backing: [base, bar1, bar2, bar3],
            outbound: WindowSize::for_window(config.ep_outbound_size())?,
        })
    }
}

/// Endpoint BAR inbound windows and the outbound memory window. Returns
/// the number of outbound windows programmed.
fn setup_ep_windows<S: RegisterSpace>(
    banks: &Banks<S>,
    cfg: &Resource,
    func: usize,
    layout: &EpLayout,
) -> Result<usize, Errno> {
    let ccsr = &banks.ccsr;

    for (bar, phys) in layout.backing.iter().enumerate() {
        ccsr.set_bar_inbound_window(func, bar, *phys)?;
    }

    ccsr.set_outbound_window(
        0,
        OutboundType::Memory,
        cfg.start,
        BusAddress::ZERO,
        layout.outbound.get(),
    )?;
    Ok(1)
}

fn setup_ep<S: RegisterSpace>(
    banks: &Banks<S>,
    cfg: &Resource,
    config: &Config,
) -> Result<usize, Errno> {
    let layout = EpLayout::new(config)?;
    for desc in layout.bars.iter() {
        banks.ccsr.setup_bar(desc);
    }

    let count = setup_ep_windows(banks, cfg, config.ep_function() as usize, &layout)?;

    set_bits(
        banks,
        regs::pab_axi_pio_ctrl(0),
        (AxiPioCtrl::APIO_EN | AxiPioCtrl::MEM_WIN_EN).bits(),
    );
    Ok(count)
}

fn enable_pio<S: RegisterSpace>(banks: &Banks<S>) {
    set_bits(banks, regs::pab_pex_pio_ctrl(0), PexPioCtrl::PPIO_EN.bits());

    banks.ccsr.modify(regs::PAB_CTRL, |val| {
        let mut ctrl: LocalRegisterCopy<u32, PAB_CTRL_REG::Register> = LocalRegisterCopy::new(val);
        ctrl.modify(PAB_CTRL_REG::APIO_EN::SET + PAB_CTRL_REG::PPIO_EN::SET);
        ctrl.get()
    });
}

impl<S: RegisterSpace> LxPcie<S> {
    /// Brings the controller up in the role its header type selects.
    ///
    /// A controller whose lanes are not configured for PCIe ends up
    /// [State::Disabled] without error. Any failure afterwards also leaves
    /// it disabled, so config accesses keep reading as "no device".
    pub fn init(&mut self, config: &Config) -> Result<State, Errno> {
        if self.state != State::Uninitialized {
            return Err(Errno::Busy);
        }
        let res = self.pending.take().ok_or(Errno::Busy)?;

        if !res.serdes_configured {
            infoln!("PCIe{}: {} disabled", self.idx, self.name());
            self.state = State::Disabled;
            return Ok(self.state);
        }

        match self.bring_up(res, config) {
            Ok(state) => Ok(state),
            Err(err) => {
                errorln!("PCIe{}: {}: bring-up failed: {:?}", self.idx, self.name(), err);
                self.state = State::Disabled;
                Err(err)
            }
        }
    }

    fn bring_up(&mut self, res: PlatformResources<S>, config: &Config) -> Result<State, Errno> {
        let idx = self.idx;
        let ccsr = required(idx, "ccsr", res.ccsr)?;
        let cfg = required(idx, "config", res.config)?;
        let lut = required(idx, "lut", res.lut)?;
        let pf_ctrl = required(idx, "pf_ctrl", res.pf_ctrl)?;

        self.cfg_res = cfg.res;
        self.regions = res.regions;
        debugln!(
            "{} ccsr: {:?}, cfg: {:?}, big-endian: {}",
            self.name(),
            ccsr.res.start,
            cfg.res.start,
            self.big_endian
        );

        let banks = Banks::new(ccsr, cfg, lut, pf_ctrl, self.big_endian);

        let header_type = banks.read_own(PCI_HEADER_TYPE, AccessWidth::Byte) as u8;
        let mode = Mode::from_header_type(header_type);
        infoln!("PCIe{}: {} {}", idx, self.name(), mode.name());

        let windows = match mode {
            Mode::RootComplex => {
                self.state = State::RootComplexSetup;
                let windows = setup_rc(&banks, &self.cfg_res, &self.regions, config)?;
                self.stream_id_cur = 0;
                windows
            }
            Mode::Endpoint => {
                self.state = State::EndpointSetup;
                setup_ep(&banks, &self.cfg_res, config)?
            }
        };
        enable_pio(&banks);

        if link::link_up(&banks.pf_ctrl) {
            let info = link::link_info(&banks.ccsr);
            infoln!("PCIe{}: {}: x{} gen{}", idx, self.name(), info.width, info.speed);
        } else {
            infoln!("PCIe{}: {}: no link", idx, self.name());
        }

        self.outbound_windows = windows;
        self.banks = Some(SpinLock::new(banks));
        self.state = State::Ready(mode);
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigKey;
    use crate::fake::{Board, FakeSpace, CFG_BASE, CFG_SIZE};
    use crate::pci::{PciAddress, PciConfigAccess};
    use crate::platform::Region;

    fn controller(board: &Board, regions: Regions) -> LxPcie<&FakeSpace> {
        LxPcie::new(board.resources(1, regions)).unwrap()
    }

    #[test]
    fn mode_from_header_type() {
        assert_eq!(Mode::from_header_type(0x00), Mode::Endpoint);
        assert_eq!(Mode::from_header_type(0x80), Mode::Endpoint);
        assert_eq!(Mode::from_header_type(0x01), Mode::RootComplex);
        assert_eq!(Mode::from_header_type(0x81), Mode::RootComplex);
    }

    #[test]
    fn rc_with_memory_region_only() {
        let board = Board::with_header_type(1);
        let regions = Regions {
            mem: Some(Region {
                phys_start: PhysicalAddress::new(0x90_4000_0000),
                bus_start: BusAddress::new(0x4000_0000),
                size: 0x4000_0000,
            }),
            ..Regions::default()
        };
        let mut pcie = controller(&board, regions);

        assert_eq!(pcie.init(&Config::new()), Ok(State::Ready(Mode::RootComplex)));
        assert_eq!(pcie.outbound_window_count(), 2);

        let cfg = pcie.outbound_window(0).unwrap();
        assert_eq!(cfg.kind(), Some(OutboundType::Config));
        assert_eq!(cfg.phys, PhysicalAddress::new(CFG_BASE));
        assert_eq!(cfg.window_size().map(|s| s.get()), Some(CFG_SIZE));

        let mem = pcie.outbound_window(1).unwrap();
        assert!(mem.is_enabled());
        assert_eq!(mem.kind(), Some(OutboundType::Memory));
        assert_eq!(mem.phys, PhysicalAddress::new(0x90_4000_0000));
        assert_eq!(mem.bus, BusAddress::new(0x4000_0000));
        assert_eq!(mem.window_size().map(|s| s.get()), Some(0x4000_0000));

        assert!(!pcie.outbound_window(2).unwrap().is_enabled());
    }

    #[test]
    fn rc_all_regions() {
        let board = Board::with_header_type(1);
        let region = |phys: u64, size: u64| Region {
            phys_start: PhysicalAddress::new(phys),
            bus_start: BusAddress::ZERO,
            size,
        };
        let regions = Regions {
            io: Some(region(0x90_1000_0000, 0x1_0000)),
            mem: Some(region(0x90_4000_0000, 0x4000_0000)),
            pref: Some(region(0x98_0000_0000, 0x8_0000_0000)),
        };
        let mut pcie = controller(&board, regions);
        pcie.init(&Config::new()).unwrap();

        assert_eq!(pcie.outbound_window_count(), 4);
        assert_eq!(pcie.outbound_window(1).unwrap().kind(), Some(OutboundType::Io));
        assert_eq!(pcie.outbound_window(2).unwrap().kind(), Some(OutboundType::Memory));
        let pref = pcie.outbound_window(3).unwrap();
        assert_eq!(pref.kind(), Some(OutboundType::Memory));
        assert_eq!(pref.ext_size, 0xFFFF_FFF8);
    }

    #[test]
    fn rc_control_registers() {
        let board = Board::with_header_type(1);
        board.ccsr.poke32(regs::GPEX_CLASSCODE, 0x0580_0012);
        let mut pcie = controller(&board, Regions::default());
        pcie.init(&Config::new()).unwrap();

        assert_eq!(board.ccsr.peek32(regs::GPEX_CLASSCODE), 0x0604_0012);
        assert_eq!(board.ccsr.peek32(regs::pab_axi_pio_ctrl(0)), 0xF);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_pio_ctrl(0)), 0x1);
        assert_eq!(board.ccsr.peek32(regs::PAB_CTRL) & 0x3, 0x3);

        // Catch-all inbound window
        let ctrl = board.ccsr.peek32(regs::pab_pex_amap_ctrl(0));
        assert_eq!(ctrl & 0x1, 1);
        assert_eq!((ctrl >> 1) & 0x3, InboundType::MemoryNoFetch.repr());
        assert_eq!(board.ccsr.peek32(regs::pab_ext_pex_amap_size(0)), 0xFFFF_FF00);
        assert_eq!(pcie.stream_id(), 0);
    }

    #[test]
    fn endpoint_bars_and_windows() {
        let board = Board::with_header_type(0);
        let mut pcie = controller(&board, Regions::default());

        assert_eq!(pcie.init(&Config::new()), Ok(State::Ready(Mode::Endpoint)));
        assert_eq!(pcie.mode(), Some(Mode::Endpoint));
        assert_eq!(pcie.outbound_window_count(), 1);

        // BAR inbound windows of function 1
        let base = 0x8040_0000;
        assert_eq!(board.ccsr.peek32(regs::pab_pex_bar_amap(1, 0)), base | 1);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_bar_amap(1, 1)), (base + 0x2000) | 1);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_bar_amap(1, 2)), (base + 0x3000) | 1);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_bar_amap(1, 3)), (base + 0x10_0000) | 1);
        assert_eq!(board.ccsr.peek32(regs::pab_ext_pex_bar_amap(1, 3)), 0);

        // Last BAR programmed is the 1 MiB one
        assert_eq!(board.ccsr.peek32(regs::GPEX_BAR_ENABLE), 0xF);
        assert_eq!(board.ccsr.peek32(regs::GPEX_BAR_SELECT), 3);
        assert_eq!(board.ccsr.peek32(regs::GPEX_BAR_SIZE_LDW), 0xFFF0_0000);

        let win = pcie.outbound_window(0).unwrap();
        assert_eq!(win.kind(), Some(OutboundType::Memory));
        assert_eq!(win.phys, PhysicalAddress::new(CFG_BASE));
        assert_eq!(win.window_size().map(|s| s.get()), Some(1 << 30));

        assert_eq!(board.ccsr.peek32(regs::pab_axi_pio_ctrl(0)), 0x3);
        assert_eq!(board.ccsr.peek32(regs::GPEX_CLASSCODE), 0);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_pio_ctrl(0)), 0x1);
    }

    #[test]
    fn endpoint_bad_bar_size_disables() {
        let board = Board::with_header_type(0);
        let mut config = Config::new();
        config.set_u64(ConfigKey::EpBar2Size, 0x800).unwrap();
        let mut pcie = controller(&board, Regions::default());

        assert_eq!(pcie.init(&config), Err(Errno::InvalidArgument));
        assert_eq!(pcie.state(), State::Disabled);
        // Rejected before any BAR is programmed
        assert_eq!(board.ccsr.peek32(regs::GPEX_BAR_ENABLE), 0);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_bar_amap(1, 0)), 0);
    }

    #[test]
    fn endpoint_memory_overflow_disables() {
        let board = Board::with_header_type(0);
        let mut config = Config::new();
        config.set_u64(ConfigKey::EpMemoryBase, 0xFFFF_FFFF_FFFF_F000).unwrap();
        let mut pcie = controller(&board, Regions::default());

        assert_eq!(pcie.init(&config), Err(Errno::InvalidArgument));
        assert_eq!(pcie.state(), State::Disabled);
        assert_eq!(board.ccsr.peek32(regs::GPEX_BAR_ENABLE), 0);
        assert_eq!(board.ccsr.peek32(regs::pab_pex_bar_amap(1, 0)), 0);
        assert_eq!(board.ccsr.peek32(regs::pab_axi_amap_ctrl(0)), 0);
    }

    #[test]
    fn endpoint_small_outbound_window_disables() {
        let board = Board::with_header_type(0);
        let mut config = Config::new();
        config.set_u64(ConfigKey::EpOutboundSize, 0x200).unwrap();
        let mut pcie = controller(&board, Regions::default());

        assert_eq!(pcie.init(&config), Err(Errno::InvalidArgument));
        assert_eq!(pcie.state(), State::Disabled);
        assert_eq!(board.ccsr.peek32(regs::GPEX_BAR_ENABLE), 0);
    }

    #[test]
    fn serdes_not_configured() {
        let board = Board::with_header_type(1);
        let mut res = board.resources(1, Regions::default());
        res.serdes_configured = false;
        let mut pcie = LxPcie::new(res).unwrap();

        assert_eq!(pcie.init(&Config::new()), Ok(State::Disabled));
        assert!(!pcie.is_enabled());
        assert_eq!(board.total_writes(), 0);
        assert_eq!(board.ccsr.read_count(), 0);
    }

    #[test]
    fn missing_resource() {
        let board = Board::with_header_type(1);
        let mut res = board.resources(1, Regions::default());
        res.lut = None;
        let mut pcie = LxPcie::new(res).unwrap();

        assert_eq!(pcie.init(&Config::new()), Err(Errno::DoesNotExist));
        assert_eq!(pcie.state(), State::Disabled);
        assert_eq!(board.total_writes(), 0);
        assert_eq!(
            pcie.read_config(PciAddress::new(1, 0, 0), 0, 4),
            Ok(0xFFFF_FFFF)
        );
    }

    #[test]
    fn second_init_is_busy() {
        let board = Board::with_header_type(1);
        let mut pcie = controller(&board, Regions::default());
        pcie.init(&Config::new()).unwrap();
        board.reset_logs();

        assert_eq!(pcie.init(&Config::new()), Err(Errno::Busy));
        assert_eq!(pcie.state(), State::Ready(Mode::RootComplex));
        assert_eq!(board.total_writes(), 0);
    }

    #[test]
    fn link_report() {
        let board = Board::with_header_type(1);
        board.set_link_up(true);
        // x4 gen3
        board.ccsr.poke32(regs::PCIE_LINK_CTRL_STA, 3 << 16 | 4 << 20);
        let mut pcie = controller(&board, Regions::default());
        pcie.init(&Config::new()).unwrap();

        assert!(pcie.link_up());
        let info = pcie.link_info().unwrap();
        assert_eq!((info.width, info.speed), (4, 3));

        board.set_link_up(false);
        assert!(!pcie.link_up());
        assert_eq!(pcie.link_info(), None);
    }
}
