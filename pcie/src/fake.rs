//! In-memory register space used by the tests in place of hardware

use crate::io::RegisterSpace;
use crate::platform::{PlatformResources, Regions, Resource};
use crate::regs;
use address::PhysicalAddress;
use core::cell::{Cell, RefCell};
use std::vec;
use std::vec::Vec;

/// One recorded access, in program order across all fakes of a test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read(&'static str, usize),
    Write(&'static str, usize, u32),
}

std::thread_local! {
    // Tests run on separate threads, so each test sees its own journal
    static JOURNAL: RefCell<Vec<Access>> = RefCell::new(Vec::new());
}

/// Accesses recorded on this thread so far
pub fn journal() -> Vec<Access> {
    JOURNAL.with(|j| j.borrow().clone())
}

pub fn clear_journal() {
    JOURNAL.with(|j| j.borrow_mut().clear());
}

/// Byte-addressed fake. When `paged` is set, accesses at or above the
/// indirect boundary are redirected through the page selected in `PAB_CTRL`,
/// the way the CCSR aperture behaves.
pub struct FakeSpace {
    name: &'static str,
    mem: RefCell<Vec<u8>>,
    paged: bool,
    writes: RefCell<Vec<(usize, u32)>>,
    reads: Cell<usize>,
}

impl FakeSpace {
    pub fn new(size: usize) -> Self {
        Self {
            name: "fake",
            mem: RefCell::new(vec![0; size]),
            paged: false,
            writes: RefCell::new(Vec::new()),
            reads: Cell::new(0),
        }
    }

    pub fn paged(size: usize) -> Self {
        Self {
            paged: true,
            ..Self::new(size)
        }
    }

    /// Names the space in the journal
    pub fn named(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    fn translate(&self, off: usize) -> usize {
        if self.paged && off >= regs::INDIRECT_ADDR_BNDRY {
            let ctrl = self.peek32(regs::PAB_CTRL);
            let page = ((ctrl >> 13) & 0x3F) as usize;
            (page << 10) | (off & 0x3FF)
        } else {
            off
        }
    }

    fn load(&self, off: usize, len: usize) -> u32 {
        let mem = self.mem.borrow();
        let mut buf = [0u8; 4];
        buf[..len].copy_from_slice(&mem[off..off + len]);
        u32::from_le_bytes(buf)
    }

    fn store(&self, off: usize, len: usize, val: u32) {
        let mut mem = self.mem.borrow_mut();
        mem[off..off + len].copy_from_slice(&val.to_le_bytes()[..len]);
    }

    /// Raw bytes at logical offset `off`
    pub fn bytes(&self, off: usize, len: usize) -> Vec<u8> {
        self.mem.borrow()[off..off + len].to_vec()
    }

    /// Little-endian word at logical offset `off`, not recorded
    pub fn peek32(&self, off: usize) -> u32 {
        self.load(off, 4)
    }

    /// Sets little-endian word at logical offset `off`, not recorded
    pub fn poke32(&self, off: usize, val: u32) {
        self.store(off, 4, val);
    }

    pub fn poke8(&self, off: usize, val: u8) {
        self.store(off, 1, val as u32);
    }

    /// All recorded writes as `(logical offset, value)`
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn reset_log(&self) {
        self.writes.borrow_mut().clear();
        self.reads.set(0);
    }

    fn read(&self, off: usize, len: usize) -> u32 {
        assert_eq!(off & (len - 1), 0, "misaligned read at {:#x}", off);
        self.reads.set(self.reads.get() + 1);
        let off = self.translate(off);
        JOURNAL.with(|j| j.borrow_mut().push(Access::Read(self.name, off)));
        self.load(off, len)
    }

    fn write(&self, off: usize, len: usize, val: u32) {
        assert_eq!(off & (len - 1), 0, "misaligned write at {:#x}", off);
        let off = self.translate(off);
        JOURNAL.with(|j| j.borrow_mut().push(Access::Write(self.name, off, val)));
        self.writes.borrow_mut().push((off, val));
        self.store(off, len, val);
    }
}

// The fake stores little-endian bytes and the tests run on little-endian
// hosts, so native order equals stored order.
impl RegisterSpace for FakeSpace {
    fn size(&self) -> usize {
        self.mem.borrow().len()
    }

    fn read8(&self, off: usize) -> u8 {
        self.read(off, 1) as u8
    }

    fn read16(&self, off: usize) -> u16 {
        u16::from_le(self.read(off, 2) as u16)
    }

    fn read32(&self, off: usize) -> u32 {
        u32::from_le(self.read(off, 4))
    }

    fn write8(&self, off: usize, val: u8) {
        self.write(off, 1, val as u32)
    }

    fn write16(&self, off: usize, val: u16) {
        self.write(off, 2, u16::to_le(val) as u32)
    }

    fn write32(&self, off: usize, val: u32) {
        self.write(off, 4, u32::to_le(val))
    }
}

pub const CCSR_BASE: u64 = 0x0360_0000;
pub const CFG_BASE: u64 = 0x90_0000_0000;
pub const CFG_SIZE: u64 = 0x1000_0000;

/// Four fake banks of one controller
pub struct Board {
    pub ccsr: FakeSpace,
    pub cfg: FakeSpace,
    pub lut: FakeSpace,
    pub pf: FakeSpace,
}

impl Board {
    pub fn new() -> Self {
        Self {
            ccsr: FakeSpace::paged(0x10000).named("ccsr"),
            cfg: FakeSpace::new(0x1000).named("cfg"),
            lut: FakeSpace::new(0x100).named("lut"),
            pf: FakeSpace::new(0x1000).named("pf"),
        }
    }

    /// Board whose header-type register reports an endpoint (0) or a bridge (1)
    pub fn with_header_type(header_type: u8) -> Self {
        let board = Self::new();
        board.ccsr.poke8(crate::pci::PCI_HEADER_TYPE, header_type);
        board
    }

    pub fn set_link_up(&self, up: bool) {
        let state = if up { regs::LTSSM_PCIE_L0 } else { 0x11 };
        self.pf.poke32(regs::PCIE_LTSSM_STA, state);
    }

    pub fn reset_logs(&self) {
        self.ccsr.reset_log();
        self.cfg.reset_log();
        self.lut.reset_log();
        self.pf.reset_log();
        clear_journal();
    }

    pub fn total_writes(&self) -> usize {
        self.ccsr.write_count() + self.cfg.write_count() + self.lut.write_count() + self.pf.write_count()
    }

    pub fn resources(&self, bus_number: u8, regions: Regions) -> PlatformResources<&FakeSpace> {
        PlatformResources {
            ccsr: Some(Resource::new(PhysicalAddress::new(CCSR_BASE), 0x10_0000).with_io(&self.ccsr)),
            config: Some(Resource::new(PhysicalAddress::new(CFG_BASE), CFG_SIZE).with_io(&self.cfg)),
            lut: Some(Resource::new(PhysicalAddress::new(CCSR_BASE + 0x8_0000), 0x1_0000).with_io(&self.lut)),
            pf_ctrl: Some(Resource::new(PhysicalAddress::new(CCSR_BASE + 0xC_0000), 0x1_0000).with_io(&self.pf)),
            big_endian: false,
            serdes_configured: true,
            bus_number,
            regions,
        }
    }
}
