//! Test doubles shared by the shellix test suites.
//!
//! [`FakeEngine`] keeps containers in memory and records every call so tests
//! can assert on what reached the engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shellix::activity::{ActivityLog, ActivityRecord};
use shellix::{
    ContainerEngine, ContainerSpec, ExecLimits, ExecutionResult, FetchLimits, ShellixOptions,
    ShellixRuntime,
};
use shellix_shared::errors::{ShellixError, ShellixResult};

/// A call that reached the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Exists(String),
    Create { name: String, image: String },
    Remove(String),
    Restart(String),
    Exec { name: String, argv: Vec<String> },
    ReadFile { name: String, path: String },
}

#[derive(Clone, Debug, Default)]
struct FakeContainer {
    image: String,
    labels: Vec<(String, String)>,
    files: HashMap<String, Vec<u8>>,
}

type ExecHandler = dyn Fn(&str) -> ExecutionResult + Send + Sync;

/// In-memory container engine.
pub struct FakeEngine {
    containers: Mutex<HashMap<String, FakeContainer>>,
    calls: Mutex<Vec<EngineCall>>,
    latency: Duration,
    unreachable: AtomicBool,
    fail_create: AtomicBool,
    fail_remove: AtomicBool,
    fail_restart: AtomicBool,
    exec_handler: Mutex<Option<Arc<ExecHandler>>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            containers: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            unreachable: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            fail_restart: AtomicBool::new(false),
            exec_handler: Mutex::new(None),
        }
    }

    /// Sleep this long inside every call, widening check-then-act windows.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    pub fn fail_create(&self, value: bool) {
        self.fail_create.store(value, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, value: bool) {
        self.fail_remove.store(value, Ordering::SeqCst);
    }

    pub fn fail_restart(&self, value: bool) {
        self.fail_restart.store(value, Ordering::SeqCst);
    }

    /// Replace the built-in command interpreter.
    pub fn on_exec<F>(&self, handler: F)
    where
        F: Fn(&str) -> ExecutionResult + Send + Sync + 'static,
    {
        *self.exec_handler.lock() = Some(Arc::new(handler));
    }

    /// Add a container directly, bypassing `create`.
    pub fn insert_container(&self, name: &str, image: &str) {
        self.containers.lock().insert(
            name.to_string(),
            FakeContainer {
                image: image.to_string(),
                ..Default::default()
            },
        );
    }

    pub fn put_file(&self, name: &str, path: &str, bytes: impl Into<Vec<u8>>) {
        if let Some(container) = self.containers.lock().get_mut(name) {
            container.files.insert(path.to_string(), bytes.into());
        }
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.containers.lock().contains_key(name)
    }

    pub fn image_of(&self, name: &str) -> Option<String> {
        self.containers.lock().get(name).map(|c| c.image.clone())
    }

    pub fn labels_of(&self, name: &str) -> Vec<(String, String)> {
        self.containers
            .lock()
            .get(name)
            .map(|c| c.labels.clone())
            .unwrap_or_default()
    }

    pub fn container_count(&self) -> usize {
        self.containers.lock().len()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Create { .. }))
    }

    pub fn remove_calls(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Remove(_)))
    }

    pub fn restart_calls(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Restart(_)))
    }

    pub fn exec_calls(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Exec { .. } | EngineCall::ReadFile { .. }))
    }

    fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    async fn enter(&self, call: EngineCall) -> ShellixResult<()> {
        self.calls.lock().push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ShellixError::EngineUnreachable(
                "Cannot connect to the Docker daemon".into(),
            ));
        }
        Ok(())
    }

    fn no_such(op: &'static str, name: &str) -> ShellixError {
        ShellixError::EngineOperation {
            op,
            name: name.to_string(),
            message: format!("Error response from daemon: No such container: {}", name),
        }
    }

    fn interpret(&self, name: &str, command: &str) -> ExecutionResult {
        let command = command.trim();
        if let Some(rest) = command.strip_prefix("echo") {
            return ExecutionResult::success(format!("{}\n", rest.trim()));
        }
        if let Some(path) = command.strip_prefix("cat ") {
            let path = path.trim();
            let containers = self.containers.lock();
            return match containers.get(name).and_then(|c| c.files.get(path)) {
                Some(bytes) => ExecutionResult::success(bytes.clone()),
                None => ExecutionResult::failure(format!(
                    "cat: {}: No such file or directory\n",
                    path
                )),
            };
        }
        match command {
            "true" | ":" => ExecutionResult::success(Vec::new()),
            "false" => ExecutionResult::failure(Vec::new()),
            _ => {
                let program = command.split_whitespace().next().unwrap_or_default();
                ExecutionResult::failure(format!("sh: {}: not found\n", program))
            }
        }
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn exists(&self, name: &str) -> ShellixResult<bool> {
        self.enter(EngineCall::Exists(name.to_string())).await?;
        Ok(self.has_container(name))
    }

    async fn create(&self, name: &str, spec: &ContainerSpec) -> ShellixResult<()> {
        self.enter(EngineCall::Create {
            name: name.to_string(),
            image: spec.image.clone(),
        })
        .await?;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ShellixError::EngineOperation {
                op: "create",
                name: name.to_string(),
                message: format!("Unable to find image '{}' locally", spec.image),
            });
        }

        let mut containers = self.containers.lock();
        if containers.contains_key(name) {
            return Err(ShellixError::EngineOperation {
                op: "create",
                name: name.to_string(),
                message: format!(
                    "Conflict. The container name \"/{}\" is already in use",
                    name
                ),
            });
        }
        containers.insert(
            name.to_string(),
            FakeContainer {
                image: spec.image.clone(),
                labels: spec.labels.clone(),
                files: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn remove(&self, name: &str) -> ShellixResult<()> {
        self.enter(EngineCall::Remove(name.to_string())).await?;
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ShellixError::EngineOperation {
                op: "remove",
                name: name.to_string(),
                message: "removal already in progress".into(),
            });
        }
        match self.containers.lock().remove(name) {
            Some(_) => Ok(()),
            None => Err(Self::no_such("remove", name)),
        }
    }

    async fn restart(&self, name: &str) -> ShellixResult<()> {
        self.enter(EngineCall::Restart(name.to_string())).await?;
        if self.fail_restart.load(Ordering::SeqCst) {
            return Err(ShellixError::EngineOperation {
                op: "restart",
                name: name.to_string(),
                message: "cannot restart container".into(),
            });
        }
        if self.has_container(name) {
            Ok(())
        } else {
            Err(Self::no_such("restart", name))
        }
    }

    async fn exec(
        &self,
        name: &str,
        argv: &[String],
        _limits: &ExecLimits,
    ) -> ShellixResult<ExecutionResult> {
        self.enter(EngineCall::Exec {
            name: name.to_string(),
            argv: argv.to_vec(),
        })
        .await?;
        if !self.has_container(name) {
            return Ok(ExecutionResult::failure(format!(
                "Error response from daemon: No such container: {}\n",
                name
            )));
        }

        // argv is [shell, "-c", line]
        let line = argv.last().map(String::as_str).unwrap_or_default();
        let handler = self.exec_handler.lock().clone();
        Ok(match handler {
            Some(handler) => handler(line),
            None => self.interpret(name, line),
        })
    }

    async fn read_file(
        &self,
        name: &str,
        path: &str,
        limits: &FetchLimits,
    ) -> ShellixResult<Vec<u8>> {
        self.enter(EngineCall::ReadFile {
            name: name.to_string(),
            path: path.to_string(),
        })
        .await?;
        let containers = self.containers.lock();
        let container = containers
            .get(name)
            .ok_or_else(|| Self::no_such("fetch", name))?;
        let bytes = container
            .files
            .get(path)
            .ok_or_else(|| ShellixError::EngineOperation {
                op: "fetch",
                name: name.to_string(),
                message: format!("cat: {}: No such file or directory", path),
            })?;
        if bytes.len() as u64 > limits.max_bytes {
            return Err(ShellixError::FileTooLarge {
                limit: limits.max_bytes,
            });
        }
        Ok(bytes.clone())
    }
}

/// Activity log that keeps records in memory.
#[derive(Default)]
pub struct MemoryActivityLog {
    records: Mutex<Vec<ActivityRecord>>,
}

impl MemoryActivityLog {
    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn append(&self, record: &ActivityRecord) -> ShellixResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// A runtime over a [`FakeEngine`] with an in-memory activity log.
pub struct TestRuntime {
    pub runtime: ShellixRuntime,
    pub engine: Arc<FakeEngine>,
    pub activity: Arc<MemoryActivityLog>,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::with_engine(FakeEngine::new())
    }

    pub fn with_engine(engine: FakeEngine) -> Self {
        Self::with_options(engine, test_options())
    }

    pub fn with_options(engine: FakeEngine, options: ShellixOptions) -> Self {
        let engine = Arc::new(engine);
        let activity = Arc::new(MemoryActivityLog::default());
        let runtime = ShellixRuntime::with_components(options, engine.clone(), activity.clone())
            .expect("test options are valid");
        Self {
            runtime,
            engine,
            activity,
        }
    }
}

impl Default for TestRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Default options without on-disk logging.
pub fn test_options() -> ShellixOptions {
    ShellixOptions {
        log_dir: None,
        ..Default::default()
    }
}
