//! Command-line definition and the options shared by every subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shellix::{ShellixOptions, ShellixRuntime};
use shellix_shared::constants::envs;

use crate::commands;

#[derive(Parser, Debug)]
#[command(name = "shellix", author, version, about = "Per-user container shells over Telegram")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Telegram bot
    Serve(commands::serve::ServeArgs),
    /// Create a user's container
    Create(commands::create::CreateArgs),
    /// Remove users' containers
    Rm(commands::rm::RmArgs),
    /// Restart users' containers
    Restart(commands::restart::RestartArgs),
    /// Run a command in a user's container
    Exec(commands::exec::ExecArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalFlags {
    /// JSON config file; flags below override its values
    #[arg(long, global = true, env = "SHELLIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Docker-compatible CLI (docker, podman)
    #[arg(long, global = true, env = "SHELLIX_ENGINE")]
    pub engine_bin: Option<String>,

    /// Directory for per-user activity logs
    #[arg(long, global = true, env = envs::LOG_DIR)]
    pub log_dir: Option<PathBuf>,

    /// Do not write activity logs
    #[arg(long, global = true, conflicts_with = "log_dir")]
    pub no_activity_log: bool,

    /// Prefix of per-user container names
    #[arg(long, global = true)]
    pub container_prefix: Option<String>,

    /// Shell used to run each command line
    #[arg(long, global = true)]
    pub shell: Option<String>,

    /// Per-command timeout in seconds (0 disables)
    #[arg(long, global = true)]
    pub exec_timeout: Option<u64>,

    /// Largest file /fetch will send, in bytes
    #[arg(long, global = true)]
    pub max_fetch_bytes: Option<u64>,
}

impl GlobalFlags {
    /// Defaults, then the config file, then flags.
    pub fn options(&self) -> anyhow::Result<ShellixOptions> {
        let mut options = match &self.config {
            Some(path) => ShellixOptions::from_json_file(path)?,
            None => ShellixOptions::default(),
        };

        if let Some(engine_bin) = &self.engine_bin {
            options.engine_bin = engine_bin.clone();
        }
        if self.no_activity_log {
            options.log_dir = None;
        } else if let Some(log_dir) = &self.log_dir {
            options.log_dir = Some(log_dir.clone());
        }
        if let Some(prefix) = &self.container_prefix {
            options.container_prefix = prefix.clone();
        }
        if let Some(shell) = &self.shell {
            options.shell = shell.clone();
        }
        if let Some(timeout) = self.exec_timeout {
            options.exec_timeout_secs = timeout;
        }
        if let Some(max) = self.max_fetch_bytes {
            options.max_fetch_bytes = max;
        }

        options.validate()?;
        Ok(options)
    }

    pub fn create_runtime(&self) -> anyhow::Result<ShellixRuntime> {
        Ok(ShellixRuntime::new(self.options()?)?)
    }
}
