//! Error types for the Palaver node.
//!
//! Failures fall into four classes, and the API layer maps each class to
//! a status code:
//!
//! - **Validation**: the request itself is malformed (empty name, bad
//!   join code, roster that cannot be split into teams).
//! - **Precondition**: the request is well-formed but illegal in the
//!   session's current state (joining after start, second role
//!   assignment, a non-CEO submitting answers).
//! - **Race lost**: a precondition held when checked but no longer held
//!   at commit; the caller may retry.
//! - **Storage/serialization/IO**: infrastructure faults.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Validation ---
    /// Roster size that does not split into teams of 4-5
    #[error(transparent)]
    Formation(#[from] palaver_core::FormationError),

    /// Malformed join code
    #[error(transparent)]
    JoinCode(#[from] palaver_core::JoinCodeError),

    /// A hand-built team plan with an out-of-range size
    #[error(transparent)]
    Assign(#[from] palaver_core::AssignError),

    /// Blank participant name
    #[error("participant name must not be empty")]
    EmptyName,

    /// Blank message body
    #[error("message content must not be empty")]
    EmptyMessage,

    /// Answer outside the briefing questions
    #[error("question number {0} is out of range: the briefing has questions 1-4")]
    QuestionOutOfRange(u8),

    // --- Preconditions ---
    /// Operation illegal in the session's current lifecycle state
    #[error(transparent)]
    Lifecycle(#[from] palaver_core::LifecycleError),

    /// Second role assignment for the same session
    #[error("roles have already been assigned for this session")]
    RolesAlreadyAssigned,

    /// Write that requires team membership from a teamless participant
    #[error("participant has no team: roles must be assigned first")]
    NoTeam,

    /// Answer submission by anyone but the team's CEO
    #[error("only the CEO submits the team's answers; participant is {role}")]
    NotCeo { role: &'static str },

    /// Join code with no live session behind it
    #[error("no open session found for code {0}")]
    CodeNotFound(String),

    /// Missing record
    #[error("not found: {0}")]
    NotFound(String),

    // --- Races ---
    /// Precondition held at check time but not at commit time
    #[error("lost a race: {0}; retry if still applicable")]
    RaceLost(&'static str),

    // --- Infrastructure ---
    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
