//! Cross-window broadcast channel abstraction (§6: channel name
//! `tourSearchChannel`).
//!
//! Modeled as scoped acquisition (§9 design note): subscribing returns a
//! handle whose `Drop` unregisters the listener, so the engine's `destroy`
//! releases every handle on every exit path without a manual cleanup array.

use serde::{Deserialize, Serialize};

/// The fixed channel name used for cross-window config-preview messages.
pub const CHANNEL_NAME: &str = "tourSearchChannel";

/// A broadcast message (§6): `{ type, data, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub r#type: String,
    pub data: serde_json::Value,
    pub timestamp: u64,
}

/// A same-origin broadcast channel. `post` is fire-and-forget; `subscribe`
/// returns a [`ListenerHandle`] which unregisters its callback when dropped.
pub trait BroadcastChannel {
    fn post(&self, message: &BroadcastMessage);
    fn subscribe(&self, callback: Box<dyn FnMut(BroadcastMessage)>) -> ListenerHandle;
}

/// An RAII handle for a registered broadcast listener. `unsubscribe` is
/// idempotent; `Drop` calls it automatically so destroying the engine
/// releases every handle even on an early-return/panic exit path.
pub struct ListenerHandle {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl ListenerHandle {
    #[must_use]
    pub fn new(unsubscribe: Box<dyn FnOnce()>) -> Self {
        Self { unsubscribe: Some(unsubscribe) }
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeChannel {
        callbacks: RefCell<Vec<(u64, Rc<RefCell<Option<Box<dyn FnMut(BroadcastMessage)>>>>)>>,
        next_id: RefCell<u64>,
    }

    impl FakeChannel {
        fn dispatch(&self, message: BroadcastMessage) {
            for (_, cb) in self.callbacks.borrow().iter() {
                if let Some(f) = cb.borrow_mut().as_mut() {
                    f(message.clone());
                }
            }
        }
    }

    impl BroadcastChannel for FakeChannel {
        fn post(&self, _message: &BroadcastMessage) {}

        fn subscribe(&self, callback: Box<dyn FnMut(BroadcastMessage)>) -> ListenerHandle {
            let id = {
                let mut n = self.next_id.borrow_mut();
                *n += 1;
                *n
            };
            let slot = Rc::new(RefCell::new(Some(callback)));
            self.callbacks.borrow_mut().push((id, Rc::clone(&slot)));
            ListenerHandle::new(Box::new(move || {
                *slot.borrow_mut() = None;
            }))
        }
    }

    #[test]
    fn dropping_handle_stops_future_callbacks() {
        let channel = FakeChannel::default();
        let received = Rc::new(RefCell::new(0));
        let received_clone = Rc::clone(&received);
        let handle = channel.subscribe(Box::new(move |_msg| {
            *received_clone.borrow_mut() += 1;
        }));

        channel.dispatch(BroadcastMessage { r#type: "config preview".into(), data: serde_json::Value::Null, timestamp: 1 });
        assert_eq!(*received.borrow(), 1);

        drop(handle);
        channel.dispatch(BroadcastMessage { r#type: "config preview".into(), data: serde_json::Value::Null, timestamp: 2 });
        assert_eq!(*received.borrow(), 1);
    }

    #[test]
    fn explicit_unsubscribe_is_equivalent_to_drop() {
        let channel = FakeChannel::default();
        let received = Rc::new(RefCell::new(0));
        let received_clone = Rc::clone(&received);
        let handle = channel.subscribe(Box::new(move |_msg| {
            *received_clone.borrow_mut() += 1;
        }));
        handle.unsubscribe();
        channel.dispatch(BroadcastMessage { r#type: "x".into(), data: serde_json::Value::Null, timestamp: 0 });
        assert_eq!(*received.borrow(), 0);
    }

    #[test]
    fn channel_name_matches_spec() {
        assert_eq!(CHANNEL_NAME, "tourSearchChannel");
    }
}
