//! Docker CLI backend.
//!
//! Shells out to a docker-compatible binary (`docker`, `podman`, ...).

use std::process::{Output, Stdio};

use async_trait::async_trait;
use shellix_shared::constants::container as const_container;
use shellix_shared::errors::{ShellixError, ShellixResult};
use tokio::process::Command;

use super::capture::{self, MergedOutput};
use super::{ContainerEngine, ContainerSpec, ExecLimits, ExecutionResult, FetchLimits};

/// Most stderr text kept from a failed file read.
const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// Diagnostics printed by the CLI when the daemon itself cannot be reached.
const UNREACHABLE_MARKERS: &[&str] = &[
    "Cannot connect to the Docker daemon",
    "Is the docker daemon running",
    "error during connect",
    "permission denied while trying to connect",
    "Cannot connect to Podman",
];

#[derive(Clone, Debug)]
pub struct DockerEngine {
    binary: String,
}

impl DockerEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    async fn output(&self, args: &[&str]) -> ShellixResult<Output> {
        let mut cmd = self.command();
        cmd.args(args);
        cmd.output().await.map_err(|e| self.spawn_error(e))
    }

    /// Run a management command, mapping a non-zero exit to an error.
    async fn run_checked(&self, op: &'static str, name: &str, args: &[&str]) -> ShellixResult<()> {
        let output = self.output(args).await?;
        if output.status.success() {
            tracing::debug!(container = %name, op, "Engine call succeeded");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            container = %name,
            op,
            status = ?output.status.code(),
            stderr = %stderr.trim(),
            "Engine call failed"
        );
        Err(classify_failure(op, name, &stderr))
    }

    fn spawn_error(&self, err: std::io::Error) -> ShellixError {
        ShellixError::EngineUnreachable(format!("failed to run '{}': {}", self.binary, err))
    }
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn exists(&self, name: &str) -> ShellixResult<bool> {
        let output = self
            .output(&["inspect", "--type", "container", "--format", "{{.Name}}", name])
            .await?;
        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_unreachable(&stderr) {
            return Err(ShellixError::EngineUnreachable(stderr.trim().to_string()));
        }
        Ok(false)
    }

    async fn create(&self, name: &str, spec: &ContainerSpec) -> ShellixResult<()> {
        let args = run_args(name, spec);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::info!(container = %name, image = %spec.image, "Creating container");
        self.run_checked("create", name, &args).await
    }

    async fn remove(&self, name: &str) -> ShellixResult<()> {
        tracing::info!(container = %name, "Removing container");
        self.run_checked("remove", name, &["rm", "-f", name]).await
    }

    async fn restart(&self, name: &str) -> ShellixResult<()> {
        tracing::info!(container = %name, "Restarting container");
        self.run_checked("restart", name, &["restart", name]).await
    }

    async fn exec(
        &self,
        name: &str,
        argv: &[String],
        limits: &ExecLimits,
    ) -> ShellixResult<ExecutionResult> {
        let mut cmd = self.command();
        cmd.arg("exec").arg(name).args(argv);

        let MergedOutput { output, status } = capture::run_merged(cmd, limits)
            .await
            .map_err(|e| self.spawn_error(e))?;
        let (raw_output, truncated) = output.into_parts();

        let exit_failed = !status.is_some_and(|s| s.success());
        if exit_failed {
            let text = String::from_utf8_lossy(&raw_output);
            if is_client_unreachable(&text) {
                return Err(ShellixError::EngineUnreachable(text.trim().to_string()));
            }
        }

        tracing::debug!(
            container = %name,
            bytes = raw_output.len(),
            exit_code = ?status.and_then(|s| s.code()),
            truncated,
            "Exec finished"
        );
        Ok(ExecutionResult {
            raw_output,
            truncated,
            exit_failed,
            timed_out: status.is_none(),
        })
    }

    async fn read_file(
        &self,
        name: &str,
        path: &str,
        limits: &FetchLimits,
    ) -> ShellixResult<Vec<u8>> {
        let mut cmd = self.command();
        cmd.args(["exec", name, "cat", "--", path])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShellixError::Internal("exec stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ShellixError::Internal("exec stderr not captured".into()))?;
        let stderr_task =
            tokio::spawn(async move { capture::read_bounded(stderr, MAX_STDERR_BYTES).await });

        let collect = async {
            match capture::read_bounded(stdout, limits.max_bytes).await? {
                Some(bytes) => Ok::<_, std::io::Error>(Some((bytes, child.wait().await?))),
                None => Ok(None),
            }
        };
        let outcome = match limits.timeout {
            Some(timeout) => tokio::time::timeout(timeout, collect).await.ok(),
            None => Some(collect.await),
        };
        let Some(outcome) = outcome else {
            let secs = limits.timeout.map(|t| t.as_secs()).unwrap_or_default();
            tracing::warn!(container = %name, path, secs, "File read timed out");
            stderr_task.abort();
            child.start_kill()?;
            let _ = child.wait().await;
            return Err(ShellixError::EngineOperation {
                op: "fetch",
                name: name.to_string(),
                message: format!("timed out after {}s", secs),
            });
        };

        let Some((bytes, status)) = outcome? else {
            tracing::warn!(
                container = %name,
                path,
                max_bytes = limits.max_bytes,
                "File exceeds fetch limit"
            );
            stderr_task.abort();
            child.start_kill()?;
            let _ = child.wait().await;
            return Err(ShellixError::FileTooLarge {
                limit: limits.max_bytes,
            });
        };

        if status.success() {
            tracing::debug!(container = %name, path, bytes = bytes.len(), "Read file");
            return Ok(bytes);
        }

        let stderr = match stderr_task.await {
            Ok(Ok(Some(buf))) => String::from_utf8_lossy(&buf).into_owned(),
            _ => String::new(),
        };
        Err(classify_failure("fetch", name, &stderr))
    }
}

fn run_args(name: &str, spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        name.to_string(),
    ];
    for (key, value) in &spec.labels {
        args.push("--label".into());
        args.push(format!("{}={}", key, value));
    }
    if let Some(hostname) = &spec.hostname {
        args.push("--hostname".into());
        args.push(hostname.clone());
    }
    if let Some(memory) = &spec.memory {
        args.push("--memory".into());
        args.push(memory.clone());
    }
    if let Some(cpus) = &spec.cpus {
        args.push("--cpus".into());
        args.push(cpus.clone());
    }
    args.push(spec.image.clone());
    args.extend(const_container::KEEPALIVE_CMD.iter().map(|s| s.to_string()));
    args
}

fn is_unreachable(stderr: &str) -> bool {
    UNREACHABLE_MARKERS.iter().any(|m| stderr.contains(m))
}

/// Exec output shares a pipe with the command, so only a lone diagnostic
/// line that starts with a marker counts as the client failing to connect.
fn is_client_unreachable(output: &str) -> bool {
    let line = output.trim();
    if line.contains('\n') {
        return false;
    }
    let line = line.strip_prefix("Error: ").unwrap_or(line);
    UNREACHABLE_MARKERS.iter().any(|m| line.starts_with(m))
}

fn classify_failure(op: &'static str, name: &str, stderr: &str) -> ShellixError {
    let message = stderr.trim();
    if is_unreachable(message) {
        return ShellixError::EngineUnreachable(message.to_string());
    }
    ShellixError::EngineOperation {
        op,
        name: name.to_string(),
        message: if message.is_empty() {
            "engine returned a non-zero exit status".to_string()
        } else {
            message.to_string()
        },
    }
}
