//! Lifecycle controller.
//!
//! Per-user state machine over {ABSENT, LIVE}. The engine is re-queried on
//! every call and each check-then-act sequence runs under the user's lock,
//! so a user never ends up with two containers.

use std::sync::Arc;

use shellix_shared::constants::container as const_container;
use shellix_shared::errors::{ShellixError, ShellixResult};

use crate::catalog::{Distribution, DistributionCatalog};
use crate::engine::ContainerSpec;
use crate::runtime::lock::UserLocks;
use crate::runtime::options::ShellixOptions;
use crate::session::{SessionRegistry, UserId};

/// Successful result of a lifecycle call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Created(Distribution),
    /// Create was a no-op because the user already has a container.
    AlreadyExists,
    Destroyed,
    Restarted,
}

#[derive(Clone)]
pub struct LifecycleController {
    registry: SessionRegistry,
    catalog: Arc<DistributionCatalog>,
    locks: UserLocks,
    options: Arc<ShellixOptions>,
}

impl LifecycleController {
    pub fn new(
        registry: SessionRegistry,
        catalog: Arc<DistributionCatalog>,
        locks: UserLocks,
        options: Arc<ShellixOptions>,
    ) -> Self {
        Self {
            registry,
            catalog,
            locks,
            options,
        }
    }

    /// Create the user's container from the distribution labelled `label`.
    ///
    /// Idempotent: a live container yields [`LifecycleOutcome::AlreadyExists`]
    /// without touching the engine further.
    pub async fn create_for(&self, user: &UserId, label: &str) -> ShellixResult<LifecycleOutcome> {
        let _guard = self.locks.acquire(user).await;
        let name = self.registry.container_name(user);

        if self.registry.is_live(user).await? {
            tracing::debug!(user_id = %user, container = %name, "Container already exists");
            return Ok(LifecycleOutcome::AlreadyExists);
        }

        let distribution = self.catalog.resolve(label).cloned().ok_or_else(|| {
            ShellixError::Validation(format!("unknown distribution: {}", label.trim()))
        })?;

        let spec = self.container_spec(user, &distribution);
        self.registry.engine().create(&name, &spec).await?;

        tracing::info!(
            user_id = %user,
            container = %name,
            image = %distribution.image,
            "Created user container"
        );
        Ok(LifecycleOutcome::Created(distribution))
    }

    /// Force-remove the user's container.
    pub async fn destroy_for(&self, user: &UserId) -> ShellixResult<LifecycleOutcome> {
        let _guard = self.locks.acquire(user).await;
        let name = self.registry.container_name(user);

        if !self.registry.is_live(user).await? {
            return Err(ShellixError::NotFound(name));
        }

        self.registry.engine().remove(&name).await?;
        tracing::info!(user_id = %user, container = %name, "Destroyed user container");
        Ok(LifecycleOutcome::Destroyed)
    }

    /// Restart the user's container. A failed restart leaves it in place.
    pub async fn restart_for(&self, user: &UserId) -> ShellixResult<LifecycleOutcome> {
        let _guard = self.locks.acquire(user).await;
        let name = self.registry.container_name(user);

        if !self.registry.is_live(user).await? {
            return Err(ShellixError::NotFound(name));
        }

        self.registry.engine().restart(&name).await?;
        tracing::info!(user_id = %user, container = %name, "Restarted user container");
        Ok(LifecycleOutcome::Restarted)
    }

    fn container_spec(&self, user: &UserId, distribution: &Distribution) -> ContainerSpec {
        ContainerSpec {
            image: distribution.image.clone(),
            labels: vec![(const_container::USER_LABEL.to_string(), user.to_string())],
            hostname: Some(const_container::HOSTNAME.to_string()),
            memory: self.options.memory.clone(),
            cpus: self.options.cpus.clone(),
        }
    }
}
