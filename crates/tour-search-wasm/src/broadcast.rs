//! [`WebBroadcastChannel`]: backs `BroadcastChannel` with a real
//! `window.BroadcastChannel("tourSearchChannel")`.
//!
//! The engine's `bind_broadcast_channel` requires `Clone + 'static`, so the
//! actual channel and its registered listeners live behind an `Rc` — cloning
//! a `WebBroadcastChannel` hands out another reference to the same
//! underlying JS channel rather than opening a second one.

use std::cell::RefCell;
use std::rc::Rc;

use tour_search_core::{BroadcastChannel, BroadcastMessage, ListenerHandle, CHANNEL_NAME};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::MessageEvent;

type Subscriber = Rc<RefCell<Option<Box<dyn FnMut(BroadcastMessage)>>>>;

struct Inner {
    channel: web_sys::BroadcastChannel,
    subscribers: RefCell<Vec<Subscriber>>,
    _onmessage: RefCell<Option<Closure<dyn FnMut(MessageEvent)>>>,
}

#[derive(Clone)]
pub struct WebBroadcastChannel {
    inner: Rc<Inner>,
}

impl WebBroadcastChannel {
    /// Opens the shared channel. Returns `None` if `BroadcastChannel` is
    /// unavailable in this context (older browsers, some worker types) —
    /// the caller then falls back to never binding a channel, so cross-tab
    /// config preview is simply unavailable rather than a startup failure.
    #[must_use]
    pub fn open() -> Option<Self> {
        let channel = web_sys::BroadcastChannel::new(CHANNEL_NAME).ok()?;
        let inner = Rc::new(Inner { channel, subscribers: RefCell::new(Vec::new()), _onmessage: RefCell::new(None) });

        let dispatch_inner = Rc::clone(&inner);
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Ok(message) = serde_wasm_bindgen::from_value::<BroadcastMessage>(event.data()) else {
                tracing::warn!("tour-search-wasm: dropping malformed broadcast message");
                return;
            };
            for subscriber in dispatch_inner.subscribers.borrow().iter() {
                if let Some(callback) = subscriber.borrow_mut().as_mut() {
                    callback(message.clone());
                }
            }
        });
        inner.channel.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        *inner._onmessage.borrow_mut() = Some(onmessage);

        Some(Self { inner })
    }
}

impl BroadcastChannel for WebBroadcastChannel {
    fn post(&self, message: &BroadcastMessage) {
        match serde_wasm_bindgen::to_value(message) {
            Ok(value) => {
                if let Err(err) = self.inner.channel.post_message(&value) {
                    tracing::warn!(?err, "tour-search-wasm: broadcast post_message failed");
                }
            }
            Err(err) => tracing::warn!(%err, "tour-search-wasm: failed to serialize broadcast message"),
        }
    }

    fn subscribe(&self, callback: Box<dyn FnMut(BroadcastMessage)>) -> ListenerHandle {
        let slot: Subscriber = Rc::new(RefCell::new(Some(callback)));
        self.inner.subscribers.borrow_mut().push(Rc::clone(&slot));
        ListenerHandle::new(Box::new(move || {
            *slot.borrow_mut() = None;
        }))
    }
}
