//! Address-translation and configuration-access core for the Layerscape
//! LX (Mobiveil-based) PCIe controller.
//!
//! The crate covers what a boot stage needs from the controller before any
//! general-purpose OS runs:
//!
//! * programming the outbound (AXI -> PCIe) and inbound (PCIe -> AXI)
//!   address translation windows,
//! * a config-space access path for the generic bus enumerator
//!   ([PciConfigAccess]),
//! * picking and running the Root Complex or Endpoint bring-up sequence.
//!
//! Hardware is reached only through the [RegisterSpace] trait, so the same
//! code runs against real MMIO ([Mmio]) or an in-memory bank.
#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
extern crate std;

#[macro_use]
pub mod debug;

pub mod sync;
pub mod io;
pub mod regs;
pub mod ccsr;
pub mod pci;
pub mod window;
pub mod link;
pub mod topology;
pub mod resolve;
pub mod access;
pub mod bar;
pub mod init;
pub mod config;
pub mod platform;
pub mod controller;
pub mod registry;
pub mod fdt;

#[cfg(test)]
pub(crate) mod fake;

pub use config::{Config, ConfigKey};
pub use controller::{LxPcie, State};
pub use init::Mode;
pub use io::{Bank, Mmio, RegisterSpace};
pub use pci::{AccessWidth, PciAddress, PciConfigAccess};
pub use platform::{MappedResource, PlatformResources, Region, Regions, Resource};
pub use registry::Registry;
pub use window::{InboundType, OutboundType, OutboundWindowInfo, WindowSize};
