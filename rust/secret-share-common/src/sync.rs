//! Thread-safety bounds that relax on single-threaded wasm targets.
//!
//! Usage trackers, blob stores and record books are shared across tasks on
//! native targets, so their traits require `Send + Sync`. In the browser
//! everything runs on one thread and the bound collapses to nothing.

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> ConditionalSync for T {}

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<T> ConditionalSync for T {}
