//! Browser-backed implementations of `tour-search-core`'s capability traits,
//! plus the `wasm-bindgen` class the host page actually imports.
//!
//! Every module here talks to a real tour object, `window.localStorage`, a
//! `BroadcastChannel`, and `setTimeout`/`setInterval` — all JS-only
//! concepts — so the whole crate is gated on `wasm32` and compiles to
//! nothing on a native target (useful for `cargo test -p tour-search-core`
//! without ever touching this crate).

#![forbid(unsafe_code)]

#[cfg(target_arch = "wasm32")]
mod adapter;
#[cfg(target_arch = "wasm32")]
mod broadcast;
#[cfg(target_arch = "wasm32")]
mod scheduler;
#[cfg(target_arch = "wasm32")]
mod storage;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use adapter::JsTourAdapter;
#[cfg(target_arch = "wasm32")]
pub use broadcast::WebBroadcastChannel;
#[cfg(target_arch = "wasm32")]
pub use scheduler::WindowScheduler;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStoragePersistentStore;
#[cfg(target_arch = "wasm32")]
pub use wasm::TourSearchEngine;
