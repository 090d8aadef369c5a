//! [`WindowScheduler`]: backs `Scheduler` with `window.setTimeout`/
//! `setInterval`. Every timer id is cancelled through the matching
//! `clearTimeout`/`clearInterval` call when its [`tour_search_core::TimerHandle`]
//! is dropped, so no outstanding timer outlives the engine that scheduled it.

use tour_search_core::{Scheduler, TimerHandle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub struct WindowScheduler {
    window: web_sys::Window,
}

impl WindowScheduler {
    /// # Panics
    /// Panics if called outside a window context (e.g. a dedicated worker).
    /// The host page that instantiates the engine always runs on a window,
    /// so this is a startup invariant rather than a runtime condition.
    #[must_use]
    pub fn new() -> Self {
        let window = web_sys::window().expect("tour-search-wasm requires a window global");
        Self { window }
    }
}

impl Default for WindowScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for WindowScheduler {
    fn after(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let callback = std::cell::RefCell::new(Some(callback));
        let closure = Closure::once_into_js(move || {
            if let Some(f) = callback.borrow_mut().take() {
                f();
            }
        });
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), delay_ms as i32)
            .unwrap_or(0);
        let window = self.window.clone();
        TimerHandle::new(Box::new(move || window.clear_timeout_with_handle(id)))
    }

    fn every(&self, interval_ms: u64, callback: Box<dyn FnMut()>) -> TimerHandle {
        let closure = Closure::wrap(callback);
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), interval_ms as i32)
            .unwrap_or(0);
        // Leak the closure: it must outlive every future tick, and is only
        // ever torn down together with the interval it drives.
        closure.forget();
        let window = self.window.clone();
        TimerHandle::new(Box::new(move || window.clear_interval_with_handle(id)))
    }
}
