//! The `secret-share` command line.
//!
//! Parsing lives in [`cli`], the work in [`ops`]; the binary only sets up
//! logging and prints what an op returns.

pub mod cli;
pub mod ops;

pub use cli::Cli;
