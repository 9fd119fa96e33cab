//! Synchronization facilities module

use core::cell::UnsafeCell;
use core::fmt;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Busy-waiting lock. Boot stages run with interrupts masked, so unlike a
/// kernel lock this one does not touch the IRQ state.
pub struct SpinLock<T> {
    value: UnsafeCell<T>,
    state: AtomicBool,
}

/// Guard-structure wrapping a reference to value owned by [SpinLock].
/// Releases the lock when dropped.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> SpinLock<T> {
    /// Constructs a new instance of the lock, wrapping `value`
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
            state: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    fn try_lock(&self) -> Result<bool, bool> {
        self.state
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
    }

    #[inline(always)]
    fn force_release(&self) {
        self.state.store(false, Ordering::Release);
    }

    /// Returns [SpinLockGuard] for this lock
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<T> {
        while self.try_lock().is_err() {
            core::hint::spin_loop();
        }

        SpinLockGuard { lock: self }
    }

    /// Returns the inner value without locking, which is fine since the
    /// borrow is exclusive
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Consumes the lock, returning the inner value
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T: fmt::Debug> fmt::Debug for SpinLockGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(unsafe { &*self.lock.value.get() }, f)
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    #[inline(always)]
    fn drop(&mut self) {
        self.lock.force_release();
    }
}

unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}
