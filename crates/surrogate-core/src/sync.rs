//! Lock helpers shared by the router and the argument queue.

use std::sync::{Mutex, MutexGuard};

/// Extension trait for `Mutex` that ignores lock poisoning.
///
/// Callbacks and base implementations never run under these locks, so the
/// guarded state stays consistent even when another thread panicked.
pub trait IgnoreLock<T> {
    /// Lock the mutex, recovering the guard from a poisoned lock.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;

    /// Run `action` with the lock held and release it before returning.
    ///
    /// Use this for acquire-mutate-release sections so the guard cannot leak
    /// into code that may re-enter the same substitute.
    fn with_lock<R>(&self, action: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> IgnoreLock<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_lock<R>(&self, action: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock_ignore_poison();
        action(&mut guard)
    }
}
