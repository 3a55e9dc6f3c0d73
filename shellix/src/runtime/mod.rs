//! Runtime facade, configuration and per-user locking.

pub mod lock;
pub mod options;

mod core;

pub use core::ShellixRuntime;
