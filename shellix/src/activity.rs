//! Per-user activity log.
//!
//! The executor records every command before running it. The default sink
//! appends `[YYYY-MM-DD HH:MM:SS] <command>` lines to `user_<id>.log`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use shellix_shared::errors::{ShellixError, ShellixResult};
use tokio::io::AsyncWriteExt;

use crate::session::UserId;

/// One executed command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityRecord {
    pub user_id: UserId,
    pub command: String,
    pub timestamp: DateTime<Local>,
}

impl ActivityRecord {
    pub fn now(user_id: UserId, command: impl Into<String>) -> Self {
        Self {
            user_id,
            command: command.into(),
            timestamp: Local::now(),
        }
    }

    /// Log line without trailing newline.
    pub fn line(&self) -> String {
        format!(
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.command
        )
    }
}

/// Append-only sink for activity records.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, record: &ActivityRecord) -> ShellixResult<()>;
}

/// Discards every record.
pub struct NoopActivityLog;

#[async_trait]
impl ActivityLog for NoopActivityLog {
    async fn append(&self, _record: &ActivityRecord) -> ShellixResult<()> {
        Ok(())
    }
}

/// Writes one file per user under a directory.
#[derive(Clone, Debug)]
pub struct FileActivityLog {
    dir: PathBuf,
}

impl FileActivityLog {
    /// Create the log directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> ShellixResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ShellixError::Config(format!(
                "failed to create log dir {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user: &UserId) -> PathBuf {
        // Reuse the injective container-name encoding so ids never escape the dir.
        let stem = crate::session::encoded_user_id(user);
        self.dir.join(format!("user_{}.log", stem))
    }
}

#[async_trait]
impl ActivityLog for FileActivityLog {
    async fn append(&self, record: &ActivityRecord) -> ShellixResult<()> {
        let path = self.path_for(&record.user_id);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let mut line = record.line();
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
