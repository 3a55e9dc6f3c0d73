//! ShellixRuntime - wires the components together and answers requests.
//!
//! This is the boundary where every error becomes user-facing text; nothing
//! raised while serving a request escapes [`ShellixRuntime::handle`].

use std::sync::Arc;

use shellix_shared::errors::{ShellixError, ShellixResult};

use crate::activity::{ActivityLog, FileActivityLog, NoopActivityLog};
use crate::catalog::DistributionCatalog;
use crate::engine::{ContainerEngine, DockerEngine};
use crate::executor::{CommandExecutor, RunOutcome};
use crate::lifecycle::{LifecycleController, LifecycleOutcome};
use crate::request::{Reply, Request};
use crate::runtime::lock::UserLocks;
use crate::runtime::options::ShellixOptions;
use crate::session::{SessionRegistry, UserId};

const MSG_NO_CONTAINER: &str = "Container does not exist. Send /create to create one.";
const MSG_ENGINE_DOWN: &str = "Container engine is unavailable. Try again later.";
const MSG_CHOOSE: &str = "Choose a distribution for your container:";

#[derive(Clone)]
pub struct ShellixRuntime {
    options: Arc<ShellixOptions>,
    catalog: Arc<DistributionCatalog>,
    registry: SessionRegistry,
    lifecycle: LifecycleController,
    executor: CommandExecutor,
}

impl ShellixRuntime {
    /// Build a runtime backed by the configured docker-compatible CLI.
    pub fn new(options: ShellixOptions) -> ShellixResult<Self> {
        let engine: Arc<dyn ContainerEngine> = Arc::new(DockerEngine::new(&options.engine_bin));
        let activity: Arc<dyn ActivityLog> = match &options.log_dir {
            Some(dir) => Arc::new(FileActivityLog::open(dir)?),
            None => Arc::new(NoopActivityLog),
        };
        Self::with_components(options, engine, activity)
    }

    /// Build a runtime around explicit collaborators.
    pub fn with_components(
        options: ShellixOptions,
        engine: Arc<dyn ContainerEngine>,
        activity: Arc<dyn ActivityLog>,
    ) -> ShellixResult<Self> {
        options.validate()?;
        let catalog = Arc::new(options.catalog()?);
        let options = Arc::new(options);
        let locks = UserLocks::new();
        let registry = SessionRegistry::new(options.container_prefix.clone(), engine);

        let lifecycle = LifecycleController::new(
            registry.clone(),
            catalog.clone(),
            locks.clone(),
            options.clone(),
        );
        let executor = CommandExecutor::new(registry.clone(), locks, activity, options.clone());

        tracing::debug!(
            distributions = catalog.entries().len(),
            prefix = %options.container_prefix,
            "Shellix runtime ready"
        );
        Ok(Self {
            options,
            catalog,
            registry,
            lifecycle,
            executor,
        })
    }

    /// Serve one request for `user`.
    pub async fn handle(&self, user: &UserId, request: Request) -> Reply {
        tracing::info!(user_id = %user, verb = request.verb(), "Handling request");

        match request {
            Request::Create { label: None } => self.offer_distributions(user).await,
            Request::Create { label: Some(label) } => {
                match self.lifecycle.create_for(user, &label).await {
                    Ok(outcome) => lifecycle_reply(outcome),
                    Err(ShellixError::Validation(_)) => Reply::ChooseDistribution {
                        prompt: format!("Unknown distribution \"{}\". {}", label.trim(), MSG_CHOOSE),
                        labels: self.labels(),
                    },
                    Err(e) => failure_reply("create", e),
                }
            }
            Request::Destroy => match self.lifecycle.destroy_for(user).await {
                Ok(outcome) => lifecycle_reply(outcome),
                Err(ShellixError::NotFound(_)) => Reply::text("Container does not exist."),
                Err(e) => failure_reply("destroy", e),
            },
            Request::Restart => match self.lifecycle.restart_for(user).await {
                Ok(outcome) => lifecycle_reply(outcome),
                Err(ShellixError::NotFound(_)) => {
                    Reply::text("Container does not exist. Use /create to create one.")
                }
                Err(e) => failure_reply("restart", e),
            },
            Request::Fetch { path } => match self.executor.fetch(user, &path).await {
                Ok(file) => Reply::Document {
                    file_name: file.file_name,
                    bytes: file.bytes,
                },
                Err(ShellixError::Validation(_)) => Reply::text("Usage: /fetch <path>"),
                Err(ShellixError::NotFound(_)) => Reply::text(MSG_NO_CONTAINER),
                Err(ShellixError::FileTooLarge { limit }) => Reply::text(format!(
                    "File is larger than the {} byte limit.",
                    limit
                )),
                Err(ShellixError::EngineOperation { message, .. }) => {
                    Reply::text(format!("Failed to fetch {}:\n{}", path.trim(), message))
                }
                Err(e) => failure_reply("fetch", e),
            },
            Request::Help => Reply::text(self.help_text()),
            Request::Unknown { verb } => {
                Reply::text(format!("Unknown command /{}.\n\n{}", verb, self.help_text()))
            }
            Request::Run { command } => match self.executor.run(user, &command).await {
                Ok(RunOutcome::Completed { text, .. }) => Reply::code(text),
                Ok(RunOutcome::NoContainer) => Reply::text(MSG_NO_CONTAINER),
                Err(e) => failure_reply("run", e),
            },
        }
    }

    async fn offer_distributions(&self, user: &UserId) -> Reply {
        match self.registry.is_live(user).await {
            Ok(true) => lifecycle_reply(LifecycleOutcome::AlreadyExists),
            Ok(false) => Reply::ChooseDistribution {
                prompt: MSG_CHOOSE.to_string(),
                labels: self.labels(),
            },
            Err(e) => failure_reply("create", e),
        }
    }

    fn labels(&self) -> Vec<String> {
        self.catalog.labels().map(str::to_string).collect()
    }

    pub fn help_text(&self) -> String {
        let distributions = self.labels().join(", ");
        format!(
            "Every message you send runs as a shell command in your own container.\n\n\
             /create [distribution] - create your container ({})\n\
             /destroy - remove your container\n\
             /restart - restart your container\n\
             /fetch <path> - download a file from your container\n\
             /help - show this message",
            distributions
        )
    }

    pub fn options(&self) -> &ShellixOptions {
        &self.options
    }

    pub fn catalog(&self) -> &DistributionCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }
}

fn lifecycle_reply(outcome: LifecycleOutcome) -> Reply {
    match outcome {
        LifecycleOutcome::Created(distribution) => Reply::text(format!(
            "Container created from {} ({}).",
            distribution.label, distribution.image
        )),
        LifecycleOutcome::AlreadyExists => Reply::text("Container already exists."),
        LifecycleOutcome::Destroyed => Reply::text("Container destroyed."),
        LifecycleOutcome::Restarted => Reply::text("Container restarted."),
    }
}

fn failure_reply(verb: &str, err: ShellixError) -> Reply {
    tracing::error!(verb, error = %err, "Request failed");
    match err {
        ShellixError::EngineUnreachable(_) => Reply::text(MSG_ENGINE_DOWN),
        ShellixError::EngineOperation { .. } => match verb {
            "create" => Reply::text("Failed to create container."),
            "destroy" => Reply::text("Failed to destroy container."),
            "restart" => Reply::text("Failed to restart container."),
            _ => Reply::text(format!("Failed to {}.", verb)),
        },
        _ => Reply::text("Request failed."),
    }
}
