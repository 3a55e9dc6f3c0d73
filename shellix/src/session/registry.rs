//! Session registry.
//!
//! Centralizes the user → container naming convention. Holds no state of its
//! own: liveness is always answered by the engine.

use std::fmt::Write;
use std::sync::Arc;

use shellix_shared::errors::ShellixResult;

use super::UserId;
use crate::engine::ContainerEngine;

#[derive(Clone)]
pub struct SessionRegistry {
    prefix: String,
    engine: Arc<dyn ContainerEngine>,
}

impl SessionRegistry {
    pub fn new(prefix: impl Into<String>, engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            prefix: prefix.into(),
            engine,
        }
    }

    /// Derive the container name for a user.
    ///
    /// `[A-Za-z0-9_]` is kept verbatim and every other byte becomes `-hh`, so
    /// distinct ids never collide and the result is a legal container name.
    pub fn container_name(&self, user: &UserId) -> String {
        container_name(&self.prefix, user)
    }

    /// Whether the user currently has a container, as reported by the engine.
    pub async fn is_live(&self, user: &UserId) -> ShellixResult<bool> {
        let name = self.container_name(user);
        let live = self.engine.exists(&name).await?;
        tracing::trace!(user_id = %user, container = %name, live, "Checked session");
        Ok(live)
    }

    pub fn engine(&self) -> &Arc<dyn ContainerEngine> {
        &self.engine
    }
}

pub(crate) fn container_name(prefix: &str, user: &UserId) -> String {
    let mut name = String::with_capacity(prefix.len() + user.as_str().len());
    name.push_str(prefix);
    for byte in user.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            name.push(byte as char);
        } else {
            let _ = write!(name, "-{:02x}", byte);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PREFIX: &str = "user_container_";

    #[test]
    fn numeric_ids_keep_reference_naming() {
        assert_eq!(
            container_name(PREFIX, &UserId::from(123456789)),
            "user_container_123456789"
        );
    }

    #[test]
    fn separators_are_hex_encoded() {
        assert_eq!(container_name(PREFIX, &UserId::from("a-b")), "user_container_a-2db");
        assert_eq!(container_name(PREFIX, &UserId::from("a b")), "user_container_a-20b");
    }

    #[test]
    fn negative_ids_do_not_collide_with_positive() {
        assert_ne!(
            container_name(PREFIX, &UserId::from(-5)),
            container_name(PREFIX, &UserId::from(5))
        );
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(id in ".*") {
            let user = UserId::new(id);
            prop_assert_eq!(container_name(PREFIX, &user), container_name(PREFIX, &user));
        }

        #[test]
        fn derivation_is_injective(a in ".{0,12}", b in ".{0,12}") {
            prop_assume!(a != b);
            prop_assert_ne!(
                container_name(PREFIX, &UserId::new(a)),
                container_name(PREFIX, &UserId::new(b))
            );
        }

        #[test]
        fn derived_names_are_engine_legal(id in ".{0,24}") {
            let name = container_name(PREFIX, &UserId::new(id));
            prop_assert!(name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-'));
        }
    }
}
