//! Command executor.
//!
//! Runs one shell line inside the user's container and fetches files out of
//! it. A command exiting non-zero is ordinary output, annotated with
//! `Error:` the way a terminal would show it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shellix_shared::errors::{ShellixError, ShellixResult};

use crate::activity::{ActivityLog, ActivityRecord};
use crate::engine::ExecutionResult;
use crate::runtime::lock::UserLocks;
use crate::runtime::options::ShellixOptions;
use crate::sanitize;
use crate::session::{SessionRegistry, UserId};

/// Prefix of output from a command that failed.
pub const ERROR_PREFIX: &str = "Error:\n";

/// Result of [`CommandExecutor::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The user has no container yet.
    NoContainer,
    Completed {
        result: ExecutionResult,
        /// Sanitized text ready for a code block.
        text: String,
    },
}

/// A file read out of a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedFile {
    /// Final path segment, used as the attachment name.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct CommandExecutor {
    registry: SessionRegistry,
    locks: UserLocks,
    activity: Arc<dyn ActivityLog>,
    options: Arc<ShellixOptions>,
}

impl CommandExecutor {
    pub fn new(
        registry: SessionRegistry,
        locks: UserLocks,
        activity: Arc<dyn ActivityLog>,
        options: Arc<ShellixOptions>,
    ) -> Self {
        Self {
            registry,
            locks,
            activity,
            options,
        }
    }

    /// Execute `command` through the configured shell in the user's container.
    pub async fn run(&self, user: &UserId, command: &str) -> ShellixResult<RunOutcome> {
        let record = ActivityRecord::now(user.clone(), command);
        if let Err(e) = self.activity.append(&record).await {
            tracing::warn!(user_id = %user, error = %e, "Failed to record activity");
        }

        let _guard = self.locks.acquire(user).await;
        if !self.registry.is_live(user).await? {
            return Ok(RunOutcome::NoContainer);
        }

        let name = self.registry.container_name(user);
        let argv = [
            self.options.shell.clone(),
            "-c".to_string(),
            command.to_string(),
        ];
        tracing::debug!(user_id = %user, container = %name, "Executing command");
        let result = self
            .registry
            .engine()
            .exec(&name, &argv, &self.options.exec_limits())
            .await?;

        if result.timed_out {
            tracing::warn!(user_id = %user, container = %name, "Command timed out");
        }
        let text = sanitize::sanitize(&display_text(&result, self.options.exec_timeout()));
        Ok(RunOutcome::Completed { result, text })
    }

    /// Read `path` from the user's container as raw bytes.
    ///
    /// A blank path is rejected before the engine is consulted.
    pub async fn fetch(&self, user: &UserId, path: &str) -> ShellixResult<FetchedFile> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ShellixError::Validation("missing file path".into()));
        }

        let _guard = self.locks.acquire(user).await;
        let name = self.registry.container_name(user);
        if !self.registry.is_live(user).await? {
            return Err(ShellixError::NotFound(name));
        }

        let bytes = self
            .registry
            .engine()
            .read_file(&name, path, &self.options.fetch_limits())
            .await?;
        tracing::info!(user_id = %user, container = %name, path, bytes = bytes.len(), "Fetched file");

        Ok(FetchedFile {
            file_name: file_name_of(path),
            bytes,
        })
    }
}

/// Text shown for a finished command, before sanitizing.
pub fn display_text(result: &ExecutionResult, timeout: Option<Duration>) -> String {
    let output = result.text();
    if !result.exit_failed {
        return output;
    }

    let mut text = format!("{}{}", ERROR_PREFIX, output);
    if result.timed_out {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        match timeout {
            Some(t) => text.push_str(&format!("Command timed out after {}s", t.as_secs())),
            None => text.push_str("Command timed out"),
        }
    }
    text
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "file".to_string())
}
