//! Controller discovery from the flattened device tree
//!
//! Each controller node provides its register ranges through `reg` and
//! `reg-names` (two address and two size cells), an optional `big-endian`
//! flag, `bus-range` and the forwarded PCI ranges. The parsers work on raw
//! big-endian property bytes so they can be used without a tree.

use crate::platform::{MappedResource, PlatformResources, Region, Regions, Resource};
use address::{join_32_bits, BusAddress, PhysicalAddress};
use error::Errno;
use fdt_rs::base::DevTree;
use fdt_rs::index::{iters::DevTreeIndexCompatibleNodeIter, DevTreeIndex, DevTreeIndexNode};
use fdt_rs::prelude::*;

/// Compatible string of the controller nodes
pub const COMPATIBLE: &str = "fsl,lx2160a-pcie";

const REG_ENTRY_SIZE: usize = 16;
const RANGES_ENTRY_SIZE: usize = 28;

const PCI_SPACE_IO: u32 = 1;
const PCI_SPACE_MEM32: u32 = 2;
const PCI_SPACE_MEM64: u32 = 3;
const PCI_PREFETCH: u32 = 1 << 30;

type INode<'a> = DevTreeIndexNode<'a, 'a, 'a>;

/// Unmapped resources of one controller node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FdtResources {
    pub ccsr: Option<Resource>,
    pub config: Option<Resource>,
    pub lut: Option<Resource>,
    pub pf_ctrl: Option<Resource>,
    pub big_endian: bool,
    pub bus_number: u8,
    pub regions: Regions,
}

fn mapped<S, F: FnMut(&'static str, Resource) -> S>(
    name: &'static str,
    res: Option<Resource>,
    map: &mut F,
) -> Option<MappedResource<S>> {
    res.map(|res| res.with_io(map(name, res)))
}

impl FdtResources {
    /// Maps the register ranges through `map` and completes the platform
    /// description. `map` gets the resource name and range.
    pub fn into_platform<S, F: FnMut(&'static str, Resource) -> S>(
        self,
        serdes_configured: bool,
        mut map: F,
    ) -> PlatformResources<S> {
        PlatformResources {
            ccsr: mapped("ccsr", self.ccsr, &mut map),
            config: mapped("config", self.config, &mut map),
            lut: mapped("lut", self.lut, &mut map),
            pf_ctrl: mapped("pf_ctrl", self.pf_ctrl, &mut map),
            big_endian: self.big_endian,
            serdes_configured,
            bus_number: self.bus_number,
            regions: self.regions,
        }
    }
}

fn cells(raw: &[u8]) -> impl Iterator<Item = u32> + '_ {
    raw.chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
}

fn cell_pair(hi: u32, lo: u32) -> u64 {
    join_32_bits(lo, hi)
}

/// Splits a string list property
pub fn string_list(raw: &[u8]) -> impl Iterator<Item = &str> {
    raw.split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .filter_map(|s| core::str::from_utf8(s).ok())
}

/// Assigns `reg` entries to the named resources. Unknown names are skipped.
pub fn parse_reg(reg: &[u8], names: &[u8], out: &mut FdtResources) -> Result<(), Errno> {
    if reg.len() % REG_ENTRY_SIZE != 0 {
        return Err(Errno::InvalidArgument);
    }

    for (entry, name) in reg.chunks_exact(REG_ENTRY_SIZE).zip(string_list(names)) {
        let mut it = cells(entry);
        let mut next = || it.next().unwrap_or(0);
        let (a0, a1, s0, s1) = (next(), next(), next(), next());
        let res = Resource::new(PhysicalAddress::new(cell_pair(a0, a1)), cell_pair(s0, s1));

        match name {
            "ccsr" => out.ccsr = Some(res),
            "config" => out.config = Some(res),
            "lut" => out.lut = Some(res),
            "pf_ctrl" => out.pf_ctrl = Some(res),
            _ => debugln!("fdt: skipping reg {:?}", name),
        }
    }
    Ok(())
}

/// Picks the first IO, memory and prefetchable memory range out of `ranges`
pub fn parse_ranges(ranges: &[u8], out: &mut Regions) -> Result<(), Errno> {
    if ranges.len() % RANGES_ENTRY_SIZE != 0 {
        return Err(Errno::InvalidArgument);
    }

    for entry in ranges.chunks_exact(RANGES_ENTRY_SIZE) {
        let mut c = [0u32; 7];
        for (dst, src) in c.iter_mut().zip(cells(entry)) {
            *dst = src;
        }
        let flags = c[0];
        let region = Region {
            bus_start: BusAddress::new(cell_pair(c[1], c[2])),
            phys_start: PhysicalAddress::new(cell_pair(c[3], c[4])),
            size: cell_pair(c[5], c[6]),
        };

        let slot = match (flags >> 24) & 0x3 {
            PCI_SPACE_IO => &mut out.io,
            PCI_SPACE_MEM32 | PCI_SPACE_MEM64 if flags & PCI_PREFETCH != 0 => &mut out.pref,
            PCI_SPACE_MEM32 | PCI_SPACE_MEM64 => &mut out.mem,
            _ => continue,
        };
        slot.get_or_insert(region);
    }
    Ok(())
}

/// Collects the resources of one controller node
pub fn node_resources(node: INode<'_>) -> Result<FdtResources, Errno> {
    let mut out = FdtResources::default();
    let mut reg = None;
    let mut names = None;

    for prop in node.props() {
        match prop.name().map_err(|_| Errno::InvalidArgument)? {
            "reg" => reg = Some(prop.raw()),
            "reg-names" => names = Some(prop.raw()),
            "big-endian" => out.big_endian = true,
            "bus-range" => {
                out.bus_number = prop.u32(0).map_err(|_| Errno::InvalidArgument)? as u8
            }
            "ranges" => parse_ranges(prop.raw(), &mut out.regions)?,
            _ => {}
        }
    }

    if let (Some(reg), Some(names)) = (reg, names) {
        parse_reg(reg, names, &mut out)?;
    }
    Ok(out)
}

/// Indexed device tree
pub struct DeviceTree {
    index: DevTreeIndex<'static, 'static>,
}

impl DeviceTree {
    /// Loads a device tree blob at `base` and indexes it into `scratch`
    ///
    /// # Safety
    ///
    /// `base` must point to a valid, permanently mapped device tree blob.
    pub unsafe fn from_raw(base: usize, scratch: &'static mut [u8]) -> Result<Self, Errno> {
        // SAFETY: guaranteed by the caller
        let tree = unsafe { DevTree::from_raw_pointer(base as *const _) }
            .map_err(|_| Errno::InvalidArgument)?;
        let layout = DevTreeIndex::get_layout(&tree).map_err(|_| Errno::InvalidArgument)?;
        let needed = layout.size() + layout.align();
        if needed > scratch.len() {
            return Err(Errno::OutOfMemory);
        }
        let index = DevTreeIndex::new(tree, &mut scratch[..needed])
            .map_err(|_| Errno::InvalidArgument)?;

        Ok(Self { index })
    }

    /// Nodes compatible with `compat`
    pub fn compatible<'a, 's>(
        &'a self,
        compat: &'s str,
    ) -> DevTreeIndexCompatibleNodeIter<'s, 'a, 'a, 'a> {
        self.index.compatible_nodes(compat)
    }

    /// Resources of every controller node, in tree order
    pub fn controllers(&self) -> impl Iterator<Item = Result<FdtResources, Errno>> + '_ {
        self.compatible(COMPATIBLE).map(|node| node_resources(node))
    }
}
