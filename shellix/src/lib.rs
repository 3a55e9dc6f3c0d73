//! Shellix - one disposable container shell per chat user.
//!
//! The crate is transport-agnostic: a frontend parses inbound messages into a
//! [`Request`], hands it to [`ShellixRuntime::handle`] together with the
//! sender's [`UserId`], and delivers the returned [`Reply`].

pub mod activity;
pub mod catalog;
pub mod engine;
pub mod executor;
pub mod lifecycle;
pub mod request;
pub mod runtime;
pub mod sanitize;
pub mod session;

pub use catalog::{Distribution, DistributionCatalog};
pub use engine::{
    ContainerEngine, ContainerSpec, DockerEngine, ExecLimits, ExecutionResult, FetchLimits,
};
pub use request::{Reply, Request};
pub use runtime::ShellixRuntime;
pub use runtime::options::ShellixOptions;
pub use session::{SessionRegistry, UserId};
pub use shellix_shared::{ShellixError, ShellixResult};
