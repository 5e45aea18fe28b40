#![warn(missing_docs)]

//! This crate constitutes a library of light weight helpers that are shared
//! across the secret-share crates: a cross-target `Send + Sync` bound and an
//! injectable wall clock.

mod sync;
pub use sync::*;

pub mod time;
pub use time::{Clock, ManualClock, SystemClock};
