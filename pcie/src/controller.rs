//! Controller instance

use crate::ccsr::Ccsr;
use crate::init::Mode;
use crate::io::{Bank, RegisterSpace};
use crate::link::{self, LinkInfo};
use crate::platform::{MappedResource, PlatformResources, Regions, Resource};
use crate::regs;
use crate::sync::SpinLock;
use crate::window::OutboundWindowInfo;
use address::PhysicalAddress;
use error::Errno;

/// Register banks of an initialized controller. Held under the controller
/// lock: config accesses to other buses reprogram outbound window 0, so the
/// target write and the data access must not be interleaved.
pub(crate) struct Banks<S> {
    pub ccsr: Ccsr<S>,
    pub cfg: S,
    pub lut: Bank<S>,
    pub pf_ctrl: Bank<S>,
}

/// Bring-up state of a controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    RootComplexSetup,
    EndpointSetup,
    Ready(Mode),
    /// Lanes not configured for PCIe, or bring-up failed
    Disabled,
}

/// LX PCIe controller
pub struct LxPcie<S> {
    pub(crate) idx: usize,
    pub(crate) ccsr_base: PhysicalAddress,
    pub(crate) bus_number: u8,
    pub(crate) big_endian: bool,
    pub(crate) state: State,
    pub(crate) stream_id_cur: u32,
    pub(crate) outbound_windows: usize,
    pub(crate) cfg_res: Resource,
    pub(crate) regions: Regions,
    pub(crate) pending: Option<PlatformResources<S>>,
    pub(crate) banks: Option<SpinLock<Banks<S>>>,
}

/// Derives the controller index from its CCSR base
pub fn controller_index(ccsr_base: PhysicalAddress) -> Result<usize, Errno> {
    let off = ccsr_base
        .offset_from(PhysicalAddress::new(regs::PCIE_SYS_BASE_ADDR))
        .ok_or(Errno::InvalidArgument)?;
    Ok((off / regs::PCIE_CCSR_SIZE) as usize)
}

impl<S: RegisterSpace> Banks<S> {
    pub(crate) fn new(
        ccsr: MappedResource<S>,
        cfg: MappedResource<S>,
        lut: MappedResource<S>,
        pf_ctrl: MappedResource<S>,
        big_endian: bool,
    ) -> Self {
        Self {
            ccsr: Ccsr::new(Bank::new(ccsr.io, big_endian)),
            cfg: cfg.io,
            lut: Bank::new(lut.io, big_endian),
            pf_ctrl: Bank::new(pf_ctrl.io, big_endian),
        }
    }
}

impl<S: RegisterSpace> LxPcie<S> {
    /// Creates an uninitialized controller from the platform's resources.
    ///
    /// Only the CCSR range is needed at this point, to derive the
    /// controller index; the rest is checked by [LxPcie::init].
    pub fn new(res: PlatformResources<S>) -> Result<Self, Errno> {
        let ccsr_base = match res.ccsr.as_ref() {
            Some(ccsr) => ccsr.res.start,
            None => {
                errorln!("lx-pcie: resource \"ccsr\" not found");
                return Err(Errno::DoesNotExist);
            }
        };
        let idx = controller_index(ccsr_base)?;

        Ok(Self {
            idx,
            ccsr_base,
            bus_number: res.bus_number,
            big_endian: res.big_endian,
            state: State::Uninitialized,
            stream_id_cur: 0,
            outbound_windows: 0,
            cfg_res: Resource::default(),
            regions: Regions::default(),
            pending: Some(res),
            banks: None,
        })
    }

    /// Creates a controller that never got its resources. Every config
    /// access to it reads as "no device".
    pub fn disabled(idx: usize, bus_number: u8) -> Self {
        Self {
            idx,
            ccsr_base: PhysicalAddress::new(
                regs::PCIE_SYS_BASE_ADDR + idx as u64 * regs::PCIE_CCSR_SIZE,
            ),
            bus_number,
            big_endian: false,
            state: State::Disabled,
            stream_id_cur: 0,
            outbound_windows: 0,
            cfg_res: Resource::default(),
            regions: Regions::default(),
            pending: None,
            banks: None,
        }
    }

    /// Controller index, derived from the CCSR base
    #[inline]
    pub const fn index(&self) -> usize {
        self.idx
    }

    #[inline]
    pub const fn bus_number(&self) -> u8 {
        self.bus_number
    }

    #[inline]
    pub const fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub const fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// Role chosen at bring-up, once ready
    pub const fn mode(&self) -> Option<Mode> {
        match self.state {
            State::Ready(mode) => Some(mode),
            _ => None,
        }
    }

    /// Returns `true` once bring-up completed
    pub fn is_enabled(&self) -> bool {
        matches!(self.state, State::Ready(_)) && self.banks.is_some()
    }

    #[inline]
    pub const fn stream_id(&self) -> u32 {
        self.stream_id_cur
    }

    /// Config window range programmed into outbound window 0
    #[inline]
    pub const fn config_resource(&self) -> Resource {
        self.cfg_res
    }

    /// Ranges forwarded by the Root Complex windows
    #[inline]
    pub const fn regions(&self) -> Regions {
        self.regions
    }

    /// Number of outbound windows programmed at bring-up
    #[inline]
    pub const fn outbound_window_count(&self) -> usize {
        self.outbound_windows
    }

    pub(crate) fn name(&self) -> PcieName {
        PcieName(self.ccsr_base)
    }

    /// Polls the link state. A disabled controller has no link.
    pub fn link_up(&self) -> bool {
        match &self.banks {
            Some(banks) => link::link_up(&banks.lock().pf_ctrl),
            None => false,
        }
    }

    /// Negotiated width and speed, if the link is up
    pub fn link_info(&self) -> Option<LinkInfo> {
        let banks = self.banks.as_ref()?.lock();
        if link::link_up(&banks.pf_ctrl) {
            Some(link::link_info(&banks.ccsr))
        } else {
            None
        }
    }

    /// Reads back outbound window `idx`
    pub fn outbound_window(&self, idx: usize) -> Result<OutboundWindowInfo, Errno> {
        match &self.banks {
            Some(banks) => banks.lock().ccsr.outbound_window(idx),
            None => Err(Errno::DoesNotExist),
        }
    }

    /// Logs the outbound windows programmed at bring-up
    pub fn dump_windows(&self) {
        if let Some(banks) = &self.banks {
            banks.lock().ccsr.dump_windows(self.outbound_windows);
        }
    }
}

/// Device name used in log messages
pub(crate) struct PcieName(PhysicalAddress);

impl core::fmt::Display for PcieName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "pcie@{:x}", self.0)
    }
}
