//! Link training state monitor
//!
//! Single point-in-time reads, no debouncing: callers wanting to wait for
//! training poll [link_up] themselves.

use crate::ccsr::Ccsr;
use crate::io::{Bank, RegisterSpace};
use crate::regs::{self, LINK_CTRL_STA, LTSSM_STA};
use tock_registers::LocalRegisterCopy;

/// Negotiated link parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkInfo {
    /// Lane count
    pub width: u32,
    /// Generation (1 = 2.5 GT/s, 2 = 5 GT/s, ...)
    pub speed: u32,
}

/// Returns the LTSSM state from the PF control bank
pub fn ltssm<S: RegisterSpace>(pf_ctrl: &Bank<S>) -> u32 {
    let sta: LocalRegisterCopy<u32, LTSSM_STA::Register> =
        LocalRegisterCopy::new(pf_ctrl.readl(regs::PCIE_LTSSM_STA));
    sta.read(LTSSM_STA::STATE)
}

/// Classifies an LTSSM state: anything before L0 is still training
#[inline]
pub const fn is_link_up(ltssm: u32) -> bool {
    ltssm >= regs::LTSSM_PCIE_L0
}

/// Returns `true` if the link has reached L0 (or a later state)
pub fn link_up<S: RegisterSpace>(pf_ctrl: &Bank<S>) -> bool {
    is_link_up(ltssm(pf_ctrl))
}

/// Reads the negotiated width and speed
pub fn link_info<S: RegisterSpace>(ccsr: &Ccsr<S>) -> LinkInfo {
    let sta: LocalRegisterCopy<u32, LINK_CTRL_STA::Register> =
        LocalRegisterCopy::new(ccsr.readl(regs::PCIE_LINK_CTRL_STA));
    LinkInfo {
        width: sta.read(LINK_CTRL_STA::WIDTH),
        speed: sta.read(LINK_CTRL_STA::SPEED),
    }
}
