//! Host timer abstraction (§5 Concurrency & Resource Model): suspension
//! happens only at documented points (network reads, fixed timer delays),
//! and every one of those delays — tour-readiness polling, trigger-retry
//! backoff, live-config polling, progressive-loading's background delay,
//! activation retry delays — is a host-scheduled timer rather than
//! something this crate blocks on. [`Scheduler`] is the capability trait
//! the `tour-search-wasm` crate backs with `setTimeout`/`setInterval`;
//! tests back it with an in-memory fake that never actually sleeps.
//!
//! Modeled as scoped acquisition, matching [`crate::broadcast::ListenerHandle`]
//! (§9 design note): scheduling returns a [`TimerHandle`] whose `Drop` cancels
//! the timer, so the engine's teardown path releases every outstanding timer
//! without a manual cleanup array.

/// A host clock/timer capability. `after` fires `callback` once, `delay_ms`
/// from now; `every` fires `callback` repeatedly on that interval (used for
/// the 2 s live-config poll).
pub trait Scheduler {
    fn after(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerHandle;
    fn every(&self, interval_ms: u64, callback: Box<dyn FnMut()>) -> TimerHandle;
}

/// An RAII handle for a scheduled timer. `cancel` is idempotent; `Drop` calls
/// it automatically, so every exit path (including an early return or a
/// panic unwind) releases the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    #[must_use]
    pub fn new(cancel: Box<dyn FnOnce()>) -> Self {
        Self { cancel: Some(cancel) }
    }

    pub fn cancel(mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A fake scheduler that never actually sleeps: `after`/`every` record
    /// their callback so tests can fire it manually and assert on ordering.
    #[derive(Default)]
    struct ManualScheduler {
        pending: RefCell<Vec<(u64, Rc<RefCell<Option<Box<dyn FnMut()>>>>)>>,
    }

    impl ManualScheduler {
        fn fire_all(&self) {
            for (_, cb) in self.pending.borrow().iter() {
                if let Some(f) = cb.borrow_mut().as_mut() {
                    f();
                }
            }
        }
    }

    impl Scheduler for ManualScheduler {
        fn after(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerHandle {
            let slot: Rc<RefCell<Option<Box<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
            let callback = RefCell::new(Some(callback));
            *slot.borrow_mut() = Some(Box::new(move || {
                if let Some(f) = callback.borrow_mut().take() {
                    f();
                }
            }));
            self.pending.borrow_mut().push((delay_ms, Rc::clone(&slot)));
            TimerHandle::new(Box::new(move || {
                *slot.borrow_mut() = None;
            }))
        }

        fn every(&self, interval_ms: u64, callback: Box<dyn FnMut()>) -> TimerHandle {
            let slot = Rc::new(RefCell::new(Some(callback)));
            self.pending.borrow_mut().push((interval_ms, Rc::clone(&slot)));
            TimerHandle::new(Box::new(move || {
                *slot.borrow_mut() = None;
            }))
        }
    }

    #[test]
    fn after_fires_recorded_callback() {
        let scheduler = ManualScheduler::default();
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = Rc::clone(&fired);
        let _handle = scheduler.after(300, Box::new(move || *fired_clone.borrow_mut() = true));
        scheduler.fire_all();
        assert!(*fired.borrow());
    }

    #[test]
    fn dropping_handle_cancels_before_it_fires() {
        let scheduler = ManualScheduler::default();
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = Rc::clone(&fired);
        let handle = scheduler.after(2_000, Box::new(move || *fired_clone.borrow_mut() = true));
        drop(handle);
        scheduler.fire_all();
        assert!(!*fired.borrow());
    }

    #[test]
    fn every_can_fire_more_than_once() {
        let scheduler = ManualScheduler::default();
        let count = Rc::new(RefCell::new(0));
        let count_clone = Rc::clone(&count);
        let _handle = scheduler.every(2_000, Box::new(move || *count_clone.borrow_mut() += 1));
        scheduler.fire_all();
        scheduler.fire_all();
        assert_eq!(*count.borrow(), 2);
    }
}
