//! Shared constants
//!
//! Values the core and the transport frontend must agree on.

/// Transport limits
pub mod transport {
    /// Maximum length of a single text message, in characters.
    pub const MAX_MESSAGE_LEN: usize = 4096;

    /// Largest document a bot may upload (50 MiB).
    pub const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

    /// Language tag used for fenced command output.
    pub const CODE_LANGUAGE: &str = "bash";

    /// Prefix of inline-keyboard callback data selecting a distribution.
    pub const CREATE_CALLBACK_PREFIX: &str = "create:";
}

/// Container naming and labelling
pub mod container {
    /// Default prefix of per-user container names.
    pub const NAME_PREFIX: &str = "user_container_";

    /// Label carrying the owning user id.
    pub const USER_LABEL: &str = "shellix.user";

    /// Hostname given to every user container.
    pub const HOSTNAME: &str = "shellix";

    /// Long-lived no-op process keeping the container alive.
    pub const KEEPALIVE_CMD: &[&str] = &["sleep", "infinity"];
}

/// Environment variables
pub mod envs {
    /// Bot token.
    pub const TOKEN: &str = "TOKEN";

    /// Activity log directory override.
    pub const LOG_DIR: &str = "SHELLIX_LOG_DIR";
}
