//! Table of probed controllers, indexed by controller number

use crate::config::Config;
use crate::controller::LxPcie;
use crate::io::RegisterSpace;
use crate::platform::PlatformResources;
use error::Errno;

/// Up to `N` controllers
pub struct Registry<S, const N: usize> {
    slots: [Option<LxPcie<S>>; N],
}

impl<S: RegisterSpace, const N: usize> Default for Registry<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RegisterSpace, const N: usize> Registry<S, N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Creates, registers and brings up a controller.
    ///
    /// A controller that fails bring-up stays registered in the disabled
    /// state, so its slot keeps answering config accesses with "no device".
    pub fn probe(
        &mut self,
        res: PlatformResources<S>,
        config: &Config,
    ) -> Result<&LxPcie<S>, Errno> {
        let mut pcie = LxPcie::new(res)?;
        let idx = pcie.index();
        if idx >= N {
            errorln!("PCIe{}: no slot (max {})", idx, N);
            return Err(Errno::OutOfRange);
        }
        if self.slots[idx].is_some() {
            return Err(Errno::AlreadyExists);
        }

        let result = pcie.init(config);
        let pcie = self.slots[idx].insert(pcie);
        result.map(|_| &*pcie)
    }

    pub fn get(&self, idx: usize) -> Option<&LxPcie<S>> {
        self.slots.get(idx)?.as_ref()
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut LxPcie<S>> {
        self.slots.get_mut(idx)?.as_mut()
    }

    pub fn remove(&mut self, idx: usize) -> Option<LxPcie<S>> {
        self.slots.get_mut(idx)?.take()
    }

    /// Iterates over registered controllers in index order
    pub fn iter(&self) -> impl Iterator<Item = &LxPcie<S>> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
