//! Command-layer error model.

use thiserror::Error;

use crate::id::Version;

/// Result type used across the command layer.
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors surfaced by the command model.
///
/// All of these are raised synchronously at the point of violation. The
/// command layer never retries and never partially applies a change; turning
/// an error into a rejected request or command is up to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// An already-attested origin was reassigned to a different party.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// A serialized record (or a constructor input) was structurally invalid.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// `object` was asked for a version the command does not create.
    #[error("unknown version: {0}")]
    UnknownVersion(Version),

    /// A declared dependency was not resolved by the caller.
    #[error("missing dependency: {0}")]
    MissingDependency(Version),
}

impl CommandError {
    pub fn state_conflict(msg: impl Into<String>) -> Self {
        Self::StateConflict(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }

    pub fn unknown_version(version: Version) -> Self {
        Self::UnknownVersion(version)
    }

    pub fn missing_dependency(version: Version) -> Self {
        Self::MissingDependency(version)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedData(err.to_string())
    }
}
