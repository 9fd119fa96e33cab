//! Resources handed over by the platform description

use address::{BusAddress, PhysicalAddress};

/// Physical address range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Resource {
    pub start: PhysicalAddress,
    pub size: u64,
}

/// Physical address range together with the register space mapping it
pub struct MappedResource<S> {
    pub res: Resource,
    pub io: S,
}

impl Resource {
    pub const fn new(start: PhysicalAddress, size: u64) -> Self {
        Self { start, size }
    }

    /// Attaches the register space through which this range is accessed
    pub fn with_io<S>(self, io: S) -> MappedResource<S> {
        MappedResource { res: self, io }
    }
}

/// Address range the host bridge forwards to the link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub phys_start: PhysicalAddress,
    pub bus_start: BusAddress,
    pub size: u64,
}

/// Forwarded ranges by kind, any of which may be absent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Regions {
    pub io: Option<Region>,
    pub mem: Option<Region>,
    pub pref: Option<Region>,
}

/// Everything a controller needs from the platform at probe time
pub struct PlatformResources<S> {
    /// Control/status registers
    pub ccsr: Option<MappedResource<S>>,
    /// Window the outbound config window forwards to the link
    pub config: Option<MappedResource<S>>,
    /// Lookup table registers
    pub lut: Option<MappedResource<S>>,
    /// Physical function control registers
    pub pf_ctrl: Option<MappedResource<S>>,
    /// Control registers are big-endian
    pub big_endian: bool,
    /// SerDes lanes of this controller are configured for PCIe
    pub serdes_configured: bool,
    /// Number of the bus the controller itself sits on
    pub bus_number: u8,
    pub regions: Regions,
}
