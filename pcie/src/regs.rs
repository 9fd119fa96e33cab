//! Register map of the LX PCIe controller
//!
//! Offsets are grouped by the bank they live in. CCSR offsets are logical:
//! anything at or above [INDIRECT_ADDR_BNDRY] is reached through the page
//! window, see [crate::ccsr].
#![allow(missing_docs)]

use bitflags::bitflags;
use tock_registers::register_bitfields;

/// Base of the first controller's CCSR block
pub const PCIE_SYS_BASE_ADDR: u64 = 0x0340_0000;
/// Stride between controller CCSR blocks
pub const PCIE_CCSR_SIZE: u64 = 0x0010_0000;

// CCSR: paging
pub const INDIRECT_ADDR_BNDRY: usize = 0xC00;
pub const PAGE_IDX_SHIFT: usize = 10;
pub const PAGE_ADDR_MASK: usize = 0x3FF;
pub const PAGE_SEL_MASK: usize = 0x3F;

// CCSR: bridge control
pub const PAB_CTRL: usize = 0x808;

#[inline(always)]
pub const fn pab_axi_pio_ctrl(idx: usize) -> usize {
    0x840 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_pex_pio_ctrl(idx: usize) -> usize {
    0x8C0 + 0x10 * idx
}

// CCSR: outbound (APIO) windows
pub const PAB_WINS_NUM: usize = 256;

#[inline(always)]
pub const fn pab_axi_amap_ctrl(idx: usize) -> usize {
    0xBA0 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_axi_amap_axi_win(idx: usize) -> usize {
    0xBA4 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_axi_amap_pex_win_l(idx: usize) -> usize {
    0xBA8 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_axi_amap_pex_win_h(idx: usize) -> usize {
    0xBAC + 0x10 * idx
}

#[inline(always)]
pub const fn pab_ext_axi_amap_axi_win(idx: usize) -> usize {
    0x80A0 + 0x4 * idx
}

#[inline(always)]
pub const fn pab_ext_axi_amap_size(idx: usize) -> usize {
    0xBAF0 + 0x4 * idx
}

// CCSR: inbound (PPIO) windows, Root Complex mode
pub const PAB_PEX_WINS_NUM: usize = 256;

#[inline(always)]
pub const fn pab_pex_amap_ctrl(idx: usize) -> usize {
    0x4BA0 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_pex_amap_axi_win(idx: usize) -> usize {
    0x4BA4 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_pex_amap_pex_win_l(idx: usize) -> usize {
    0x4BA8 + 0x10 * idx
}

#[inline(always)]
pub const fn pab_pex_amap_pex_win_h(idx: usize) -> usize {
    0x4BAC + 0x10 * idx
}

#[inline(always)]
pub const fn pab_ext_pex_amap_axi_win(idx: usize) -> usize {
    0xB4A0 + 0x4 * idx
}

#[inline(always)]
pub const fn pab_ext_pex_amap_size(idx: usize) -> usize {
    0xBEF0 + 0x4 * idx
}

// CCSR: inbound windows, Endpoint mode (one per function/BAR)
pub const BAR_AMAP_EN: u32 = 1 << 0;

#[inline(always)]
pub const fn pab_pex_bar_amap(pf: usize, bar: usize) -> usize {
    0x1BA0 + 0x20 * pf + 0x4 * bar
}

#[inline(always)]
pub const fn pab_ext_pex_bar_amap(pf: usize, bar: usize) -> usize {
    0x84A0 + 0x20 * pf + 0x4 * bar
}

// CCSR: GPEX (own config header emulation)
pub const PCIE_LINK_CTRL_STA: usize = 0x5C;
pub const GPEX_CLASSCODE: usize = 0x474;
pub const GPEX_BAR_ENABLE: usize = 0x4D4;
pub const GPEX_BAR_SIZE_LDW: usize = 0x4D8;
pub const GPEX_BAR_SIZE_UDW: usize = 0x4DC;
pub const GPEX_BAR_SELECT: usize = 0x4E0;

// LUT
pub const PCIE_LUT_GCR: usize = 0x28;

// PF control
pub const PCIE_LTSSM_STA: usize = 0x7FC;
pub const LTSSM_PCIE_L0: u32 = 0x2D;

register_bitfields! {
    u32,
    /// Bridge control
    pub PAB_CTRL_REG [
        APIO_EN OFFSET(0) NUMBITS(1) [],
        PPIO_EN OFFSET(1) NUMBITS(1) [],
        MAX_BRST_LEN OFFSET(4) NUMBITS(2) [],
        PAGE_SEL OFFSET(13) NUMBITS(6) [],
        FUNC_SEL OFFSET(19) NUMBITS(9) []
    ],
    /// Outbound window control
    pub AXI_AMAP_CTRL [
        EN OFFSET(0) NUMBITS(1) [],
        TYPE OFFSET(1) NUMBITS(2) [],
        SIZE OFFSET(10) NUMBITS(22) []
    ],
    /// Inbound window control
    pub PEX_AMAP_CTRL [
        EN OFFSET(0) NUMBITS(1) [],
        TYPE OFFSET(1) NUMBITS(2) [],
        SIZE OFFSET(10) NUMBITS(22) []
    ],
    /// Config access target, written to outbound window 0's bus address
    pub PAB_TARGET [
        FUNC OFFSET(16) NUMBITS(3) [],
        DEV OFFSET(19) NUMBITS(5) [],
        BUS OFFSET(24) NUMBITS(8) []
    ],
    pub GPEX_CLASSCODE_REG [
        CLASSCODE OFFSET(16) NUMBITS(16) []
    ],
    pub LINK_CTRL_STA [
        SPEED OFFSET(16) NUMBITS(4) [],
        WIDTH OFFSET(20) NUMBITS(6) []
    ],
    pub LUT_GCR [
        /// Completion retry response enable
        RRE OFFSET(0) NUMBITS(1) []
    ],
    pub LTSSM_STA [
        STATE OFFSET(0) NUMBITS(6) []
    ]
}

bitflags! {
    /// AMBA-side PIO engine control (`PAB_AXI_PIO_CTRL`)
    pub struct AxiPioCtrl: u32 {
        const APIO_EN = 1 << 0;
        const MEM_WIN_EN = 1 << 1;
        const IO_WIN_EN = 1 << 2;
        const CFG_WIN_EN = 1 << 3;
    }
}

bitflags! {
    /// PCIe-side PIO engine control (`PAB_PEX_PIO_CTRL`)
    pub struct PexPioCtrl: u32 {
        const PPIO_EN = 1 << 0;
    }
}
