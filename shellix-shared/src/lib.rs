//! Shellix Shared - types used by the core runtime and the bot frontend
//!
//! This crate contains the error type and constants that both sides
//! of the request boundary must agree on.

pub mod constants;
pub mod errors;

pub use errors::{ShellixError, ShellixResult};
