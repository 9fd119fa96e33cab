//! Config-space gateway used by the bus enumerator
//!
//! Accesses the validator rejects never reach the hardware: reads return
//! all-ones of the access width and writes are dropped, which is what the
//! enumerator expects from an empty slot.

use crate::controller::{Banks, LxPcie};
use crate::init::Mode;
use crate::io::RegisterSpace;
use crate::link;
use crate::pci::{
    AccessWidth, PciAddress, PciConfigAccess, PCI_CFG_SPACE_SIZE, PCI_HEADER_TYPE, PCI_VENDOR_ID,
};
use crate::topology;
use error::Errno;

/// Checks access width and offset before anything touches the hardware
pub fn check_access(offset: usize, size: usize) -> Result<AccessWidth, Errno> {
    let width = AccessWidth::try_from(size)?;
    if offset >= PCI_CFG_SPACE_SIZE || offset % width.bytes() != 0 {
        return Err(Errno::InvalidArgument);
    }
    Ok(width)
}

impl<S: RegisterSpace> LxPcie<S> {
    /// Runs `f` under the controller lock if `addr` is reachable.
    ///
    /// An Endpoint has no config window: its outbound window 0 is the
    /// memory window, so only its own header can be accessed.
    fn with_reachable<R, F: FnOnce(&Banks<S>) -> R>(&self, addr: PciAddress, f: F) -> Option<R> {
        let banks = self.banks.as_ref()?.lock();
        topology::check(self.is_enabled(), self.bus_number, addr, || {
            link::link_up(&banks.pf_ctrl)
        })
        .ok()?;
        if addr.bus() != self.bus_number && self.mode() != Some(Mode::RootComplex) {
            return None;
        }
        Some(f(&banks))
    }
}

impl<S: RegisterSpace> PciConfigAccess for LxPcie<S> {
    fn read_config(&self, addr: PciAddress, offset: usize, size: usize) -> Result<u32, Errno> {
        let width = check_access(offset, size)?;
        let value = self.with_reachable(addr, |banks| {
            let target = banks.resolve(self.bus_number, addr, offset);
            // Retries on probe reads would stall the enumerator on an
            // absent device
            let probe = offset == PCI_HEADER_TYPE || offset == PCI_VENDOR_ID;
            if probe {
                banks.set_retry_response(false);
            }
            let value = banks.read(target, width);
            if probe {
                banks.set_retry_response(true);
            }
            value
        });
        Ok(value.unwrap_or_else(|| width.poison()))
    }

    fn write_config(
        &self,
        addr: PciAddress,
        offset: usize,
        size: usize,
        value: u32,
    ) -> Result<(), Errno> {
        let width = check_access(offset, size)?;
        self.with_reachable(addr, |banks| {
            let target = banks.resolve(self.bus_number, addr, offset);
            banks.write(target, width, value);
        });
        Ok(())
    }
}
