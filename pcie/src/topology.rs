//! Bus topology rules
//!
//! The controller sits on bus `own` and has a single point-to-point link
//! below it, so only device 0 exists on its own bus and on the bus directly
//! behind the link.

use crate::pci::PciAddress;

/// Reason an address was found unreachable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Controller is not enabled
    Disabled,
    /// Bus lies upstream of the controller
    Upstream,
    /// Bus lies downstream but the link never trained
    LinkDown,
    /// Only device 0 exists on the own bus and the bus behind the link
    NotPresent,
}

/// Checks whether `addr` is reachable from a controller on bus `own`.
///
/// Rules are applied in order; `link_up` is only consulted for
/// downstream buses.
pub fn check<F: FnOnce() -> bool>(
    enabled: bool,
    own: u8,
    addr: PciAddress,
    link_up: F,
) -> Result<(), Rejection> {
    let bus = addr.bus() as u16;
    let own = own as u16;

    if !enabled {
        return Err(Rejection::Disabled);
    }
    if bus < own {
        return Err(Rejection::Upstream);
    }
    if bus > own && !link_up() {
        return Err(Rejection::LinkDown);
    }
    if bus <= own + 1 && addr.dev() > 0 {
        return Err(Rejection::NotPresent);
    }

    Ok(())
}
