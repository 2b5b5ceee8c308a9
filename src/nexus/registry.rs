//! Registry of active hooks.
//!
//! # Responsibilities
//! - Hold the ordered set of registered hooks
//! - Enforce one hook per instance and one hook per thread id
//! - Give the SIGIO handler a non-blocking way in
//!
//! # Design Decisions
//! - Linear lookup: size is bounded by the worker thread count
//! - One mutex serializes every mutation
//! - The handler never waits on the mutex; it uses `try_lock` and defers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::lifecycle::fatal::fatal;
use crate::nexus::error::RegistryError;
use crate::nexus::hook::{AppTid, Hook};

/// Ordered, mutex-protected collection of hooks.
#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: Mutex<Vec<Arc<Hook>>>,
    /// Set by the handler when it found the lock held.
    deferred: AtomicBool,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Hook>>> {
        self.hooks
            .lock()
            .unwrap_or_else(|_| fatal("hook registry mutex poisoned"))
    }

    /// Append `hook` unless it, or another hook with its thread id, is present.
    pub fn insert(&self, hook: &Arc<Hook>) -> Result<(), RegistryError> {
        let mut hooks = self.lock();

        if hooks.iter().any(|h| Arc::ptr_eq(h, hook)) {
            return Err(RegistryError::AlreadyRegistered {
                hook: hook.addr(),
                tid: hook.app_tid(),
            });
        }

        if hooks.iter().any(|h| h.app_tid() == hook.app_tid()) {
            return Err(RegistryError::DuplicateThreadId(hook.app_tid()));
        }

        hooks.push(hook.clone());
        Ok(())
    }

    /// Remove `hook`, keeping the order of the others.
    pub fn remove(&self, hook: &Arc<Hook>) -> Result<(), RegistryError> {
        let mut hooks = self.lock();

        match hooks.iter().position(|h| Arc::ptr_eq(h, hook)) {
            Some(idx) => {
                hooks.remove(idx);
                Ok(())
            }
            None => Err(RegistryError::NotRegistered {
                hook: hook.addr(),
                tid: hook.app_tid(),
            }),
        }
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Thread ids of registered hooks, in registration order.
    pub fn thread_ids(&self) -> Vec<AppTid> {
        self.lock().iter().map(|h| h.app_tid()).collect()
    }

    /// Whether a hook with `tid` is registered.
    pub fn contains_tid(&self, tid: AppTid) -> bool {
        self.lock().iter().any(|h| h.app_tid() == tid)
    }

    /// Run `f` over the hook list without blocking.
    ///
    /// Returns `None` if the lock is held elsewhere. In that case the deferred
    /// flag is left set and whoever holds the lock sees it via
    /// [`take_deferred`](Self::take_deferred) after releasing.
    pub(crate) fn try_with_hooks<R>(&self, f: impl Fn(&[Arc<Hook>]) -> R) -> Option<R> {
        if let Some(r) = self.try_run(&f) {
            return Some(r);
        }

        self.deferred.store(true, Ordering::SeqCst);

        // the holder may have released and checked the flag before our store
        let r = self.try_run(&f)?;
        self.deferred.store(false, Ordering::SeqCst);
        Some(r)
    }

    fn try_run<R>(&self, f: &impl Fn(&[Arc<Hook>]) -> R) -> Option<R> {
        match self.hooks.try_lock() {
            Ok(hooks) => Some(f(&hooks)),
            Err(TryLockError::Poisoned(p)) => Some(f(&PoisonError::into_inner(p))),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Clear and return the deferred flag.
    pub(crate) fn take_deferred(&self) -> bool {
        self.deferred.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexus::hook::EventCounter;

    fn hook(tid: u8) -> Arc<Hook> {
        Hook::new(AppTid(tid), Arc::new(EventCounter::new()))
    }

    #[test]
    fn insert_and_remove_keep_order() {
        let registry = HookRegistry::new();
        let hooks: Vec<_> = [3, 1, 4, 5, 9].into_iter().map(hook).collect();
        for h in &hooks {
            registry.insert(h).unwrap();
        }
        registry.remove(&hooks[1]).unwrap();
        registry.remove(&hooks[4]).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.thread_ids(), vec![AppTid(3), AppTid(4), AppTid(5)]);
    }

    #[test]
    fn reinsert_after_remove_goes_to_the_back() {
        let registry = HookRegistry::new();
        let a = hook(1);
        let b = hook(2);
        registry.insert(&a).unwrap();
        registry.insert(&b).unwrap();
        registry.remove(&a).unwrap();
        registry.insert(&a).unwrap();
        assert_eq!(registry.thread_ids(), vec![AppTid(2), AppTid(1)]);
    }

    #[test]
    fn same_instance_twice_is_rejected() {
        let registry = HookRegistry::new();
        let a = hook(5);
        registry.insert(&a).unwrap();
        let err = registry.insert(&a).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { tid: AppTid(5), .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn shared_thread_id_is_rejected() {
        let registry = HookRegistry::new();
        registry.insert(&hook(7)).unwrap();
        let err = registry.insert(&hook(7)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateThreadId(AppTid(7)));
        assert_eq!(registry.thread_ids(), vec![AppTid(7)]);
    }

    #[test]
    fn removing_absent_hook_is_rejected() {
        let registry = HookRegistry::new();
        registry.insert(&hook(1)).unwrap();
        let err = registry.remove(&hook(1)).unwrap_err();
        assert!(matches!(err, RegistryError::NotRegistered { tid: AppTid(1), .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_registration_from_threads() {
        let registry = Arc::new(HookRegistry::new());
        let handles: Vec<_> = (0..16u8)
            .map(|tid| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let h = hook(tid);
                    registry.insert(&h).unwrap();
                    if tid % 2 == 1 {
                        registry.remove(&h).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut tids = registry.thread_ids();
        tids.sort();
        let expected: Vec<_> = (0..16u8).filter(|t| t % 2 == 0).map(AppTid).collect();
        assert_eq!(tids, expected);
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn try_with_hooks_defers_while_locked() {
        let registry = HookRegistry::new();
        registry.insert(&hook(1)).unwrap();

        let guard = registry.hooks.lock().unwrap();
        assert!(registry.try_with_hooks(|hooks| hooks.len()).is_none());
        drop(guard);

        assert!(registry.take_deferred());
        assert!(!registry.take_deferred());
        assert_eq!(registry.try_with_hooks(|hooks| hooks.len()), Some(1));
    }
}
