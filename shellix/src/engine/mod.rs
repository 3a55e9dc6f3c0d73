//! Container runtime adapter.
//!
//! Narrow interface over an external container engine. Every call is a single
//! attempt; callers decide what a failure means for the user.

mod capture;
mod docker;

pub use docker::DockerEngine;

use async_trait::async_trait;
use shellix_shared::errors::ShellixResult;
use std::time::Duration;

/// Engine operations used by the lifecycle controller and command executor.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Whether a container with this name exists.
    ///
    /// "No such container" is `Ok(false)`; only failing to reach the engine
    /// is an error.
    async fn exists(&self, name: &str) -> ShellixResult<bool>;

    /// Create and start a detached container running a keep-alive process.
    async fn create(&self, name: &str, spec: &ContainerSpec) -> ShellixResult<()>;

    /// Force-remove a container, running or not.
    async fn remove(&self, name: &str) -> ShellixResult<()>;

    async fn restart(&self, name: &str) -> ShellixResult<()>;

    /// Run `argv` inside the container with stdout and stderr merged.
    ///
    /// A non-zero exit is returned as `Ok` with `exit_failed` set.
    async fn exec(
        &self,
        name: &str,
        argv: &[String],
        limits: &ExecLimits,
    ) -> ShellixResult<ExecutionResult>;

    /// Read a file from the container as raw bytes, bounded in size and time.
    async fn read_file(
        &self,
        name: &str,
        path: &str,
        limits: &FetchLimits,
    ) -> ShellixResult<Vec<u8>>;
}

/// Parameters of a new user container.
#[derive(Clone, Debug, Default)]
pub struct ContainerSpec {
    pub image: String,
    pub labels: Vec<(String, String)>,
    pub hostname: Option<String>,
    /// Memory limit in engine syntax, e.g. "512m".
    pub memory: Option<String>,
    /// CPU quota in engine syntax, e.g. "0.5".
    pub cpus: Option<String>,
}

/// Bounds applied to a single exec.
#[derive(Clone, Debug)]
pub struct ExecLimits {
    /// Kill the exec client after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Only the most recent `max_output_bytes` of output are kept.
    pub max_output_bytes: usize,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            max_output_bytes: 1024 * 1024,
        }
    }
}

/// Bounds applied to a single file read.
#[derive(Clone, Debug)]
pub struct FetchLimits {
    /// Give up and kill the reader after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Reading more than this many bytes fails with `FileTooLarge`.
    pub max_bytes: u64,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Combined output of one exec.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub raw_output: Vec<u8>,
    /// Leading output was dropped to respect `max_output_bytes`.
    pub truncated: bool,
    /// The process exited non-zero or was killed.
    pub exit_failed: bool,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn success(output: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_output: output.into(),
            ..Default::default()
        }
    }

    pub fn failure(output: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_output: output.into(),
            exit_failed: true,
            ..Default::default()
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw_output).into_owned()
    }
}
