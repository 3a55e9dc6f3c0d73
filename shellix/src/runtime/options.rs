//! Configuration for Shellix.
//!
//! Built once at startup (defaults, then an optional JSON file, then CLI
//! flags) and shared by reference with every component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shellix_shared::constants::{container as const_container, transport as const_transport};
use shellix_shared::errors::{ShellixError, ShellixResult};

use crate::catalog::{self, Distribution, DistributionCatalog};
use crate::engine::{ExecLimits, FetchLimits};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShellixOptions {
    /// Docker-compatible CLI used to drive containers.
    ///
    /// Default: "docker"
    #[serde(default = "default_engine_bin")]
    pub engine_bin: String,

    /// Fixed prefix of per-user container names.
    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,

    /// Shell that runs each command line inside the container.
    ///
    /// Default: "/bin/sh", present in every default distribution.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Directory of per-user activity logs. `None` disables logging.
    #[serde(default = "default_log_dir")]
    pub log_dir: Option<PathBuf>,

    /// Per-command timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,

    /// Most command output kept in memory; older output is dropped.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Largest file `fetch` will return.
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: u64,

    /// Memory limit for user containers, engine syntax (e.g. "512m").
    #[serde(default)]
    pub memory: Option<String>,

    /// CPU quota for user containers, engine syntax (e.g. "1.5").
    #[serde(default)]
    pub cpus: Option<String>,

    /// Distributions offered by `create`.
    #[serde(default = "catalog::default_distributions")]
    pub distributions: Vec<Distribution>,
}

fn default_engine_bin() -> String {
    "docker".to_string()
}

fn default_container_prefix() -> String {
    const_container::NAME_PREFIX.to_string()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_log_dir() -> Option<PathBuf> {
    Some(PathBuf::from("/var/log/shellix"))
}

fn default_exec_timeout_secs() -> u64 {
    60
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

fn default_max_fetch_bytes() -> u64 {
    const_transport::MAX_DOCUMENT_BYTES
}

impl Default for ShellixOptions {
    fn default() -> Self {
        Self {
            engine_bin: default_engine_bin(),
            container_prefix: default_container_prefix(),
            shell: default_shell(),
            log_dir: default_log_dir(),
            exec_timeout_secs: default_exec_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            max_fetch_bytes: default_max_fetch_bytes(),
            memory: None,
            cpus: None,
            distributions: catalog::default_distributions(),
        }
    }
}

impl ShellixOptions {
    /// Load options from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> ShellixResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ShellixError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let options: Self = serde_json::from_str(&raw)?;
        Ok(options)
    }

    /// Check invariants that would otherwise surface mid-request.
    pub fn validate(&self) -> ShellixResult<()> {
        if self.engine_bin.trim().is_empty() {
            return Err(ShellixError::Config("engine_bin must not be empty".into()));
        }
        if self.shell.trim().is_empty() {
            return Err(ShellixError::Config("shell must not be empty".into()));
        }
        let prefix_ok = self
            .container_prefix
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphanumeric())
            && self
                .container_prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));
        if !prefix_ok {
            return Err(ShellixError::Config(format!(
                "invalid container prefix: {:?}",
                self.container_prefix
            )));
        }
        if self.max_output_bytes == 0 {
            return Err(ShellixError::Config("max_output_bytes must be positive".into()));
        }
        DistributionCatalog::new(self.distributions.clone())?;
        Ok(())
    }

    pub fn catalog(&self) -> ShellixResult<DistributionCatalog> {
        DistributionCatalog::new(self.distributions.clone())
    }

    pub fn exec_timeout(&self) -> Option<Duration> {
        (self.exec_timeout_secs > 0).then(|| Duration::from_secs(self.exec_timeout_secs))
    }

    /// File reads share the exec timeout.
    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            timeout: self.exec_timeout(),
            max_bytes: self.max_fetch_bytes,
        }
    }

    pub fn exec_limits(&self) -> ExecLimits {
        ExecLimits {
            timeout: self.exec_timeout(),
            max_output_bytes: self.max_output_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let options = ShellixOptions::default();
        options.validate().unwrap();
        assert_eq!(options.container_prefix, "user_container_");
        assert_eq!(options.exec_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shellix.json");
        std::fs::write(
            &path,
            r#"{
                "engine_bin": "podman",
                "exec_timeout_secs": 0,
                "distributions": [{"label": "Alpine", "image": "alpine:3.20"}]
            }"#,
        )
        .unwrap();

        let options = ShellixOptions::from_json_file(&path).unwrap();
        assert_eq!(options.engine_bin, "podman");
        assert_eq!(options.exec_timeout(), None);
        assert_eq!(options.shell, "/bin/sh");
        assert_eq!(options.catalog().unwrap().entries().len(), 1);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ShellixOptions::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ShellixError::Config(_)));
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let options = ShellixOptions {
            container_prefix: "/etc".into(),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let options = ShellixOptions {
            distributions: vec![],
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
