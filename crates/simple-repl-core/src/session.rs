//! Session identity types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix every session name is composed with unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "simple_repl";

/// Fully composed name of a REPL session, e.g. `simple_repl:db`.
///
/// The prefix keeps sessions from colliding with unrelated terminals that
/// share the same host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    /// Compose a session name from a prefix and an optional caller-chosen name.
    ///
    /// The name is used verbatim. An absent or empty name yields the bare
    /// prefix.
    pub fn compose(prefix: &str, name: Option<&str>) -> Self {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => Self(format!("{prefix}:{name}")),
            None => Self(prefix.to_string()),
        }
    }

    /// The composed name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of one spawned session.
///
/// A name can be reused after its session is closed; the id never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a REPL session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Process is running
    Running,
    /// Process exited on its own
    Exited,
    /// Session was closed explicitly
    Terminated,
}
