//! Session lifecycle.
//!
//! A session moves strictly forward through three states:
//!
//! ```text
//! waiting ──start──▶ in_progress ──end──▶ completed
//! ```
//!
//! `waiting` is the lobby: joining and role assignment happen here and
//! nowhere else. `in_progress` is live negotiation. `completed` is
//! terminal; a completed session accepts no writes of any kind and its
//! join code can be reused by a later session.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SessionStatus {
    Waiting,
    InProgress,
    Completed,
}

/// A lifecycle guard failed: the operation is not legal in this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("session is {status} and no longer accepts joins")]
    NotJoinable { status: SessionStatus },
    #[error("roles are assigned in the lobby, but the session is {status}")]
    NotAssignable { status: SessionStatus },
    #[error("cannot start a session that is {status}")]
    NotStartable { status: SessionStatus },
    #[error("cannot end a session that is {status}")]
    NotEndable { status: SessionStatus },
    #[error("session has completed and accepts no further writes")]
    Completed,
}

impl SessionStatus {
    /// Wire string, as stored and served.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    /// No further transitions leave this state.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }

    /// Joining is a lobby-only operation.
    pub fn ensure_joinable(self) -> Result<(), LifecycleError> {
        match self {
            SessionStatus::Waiting => Ok(()),
            status => Err(LifecycleError::NotJoinable { status }),
        }
    }

    /// Role assignment is a lobby-only operation.
    pub fn ensure_assignable(self) -> Result<(), LifecycleError> {
        match self {
            SessionStatus::Waiting => Ok(()),
            status => Err(LifecycleError::NotAssignable { status }),
        }
    }

    /// Messages and answers stop at completion, nowhere earlier.
    pub fn ensure_accepts_writes(self) -> Result<(), LifecycleError> {
        match self {
            SessionStatus::Completed => Err(LifecycleError::Completed),
            _ => Ok(()),
        }
    }

    /// The `start` transition. Only the lobby can go live.
    pub fn start(self) -> Result<SessionStatus, LifecycleError> {
        match self {
            SessionStatus::Waiting => Ok(SessionStatus::InProgress),
            status => Err(LifecycleError::NotStartable { status }),
        }
    }

    /// The `end` transition. Only a live session can complete.
    pub fn end(self) -> Result<SessionStatus, LifecycleError> {
        match self {
            SessionStatus::InProgress => Ok(SessionStatus::Completed),
            status => Err(LifecycleError::NotEndable { status }),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(SessionStatus::Waiting),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error for a status string outside the three wire names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown session status {0:?}")]
pub struct UnknownStatus(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_moves_forward_only() {
        let lobby = SessionStatus::Waiting;
        let live = lobby.start().unwrap();
        assert_eq!(live, SessionStatus::InProgress);
        let done = live.end().unwrap();
        assert_eq!(done, SessionStatus::Completed);
        assert!(done.is_terminal());
    }

    #[test]
    fn start_requires_the_lobby() {
        assert_eq!(
            SessionStatus::InProgress.start(),
            Err(LifecycleError::NotStartable { status: SessionStatus::InProgress })
        );
        assert!(SessionStatus::Completed.start().is_err());
    }

    #[test]
    fn end_requires_a_live_session() {
        assert_eq!(
            SessionStatus::Waiting.end(),
            Err(LifecycleError::NotEndable { status: SessionStatus::Waiting })
        );
        assert!(SessionStatus::Completed.end().is_err());
    }

    #[test]
    fn joining_and_assignment_are_lobby_only() {
        assert!(SessionStatus::Waiting.ensure_joinable().is_ok());
        assert!(SessionStatus::Waiting.ensure_assignable().is_ok());
        for status in [SessionStatus::InProgress, SessionStatus::Completed] {
            assert!(status.ensure_joinable().is_err());
            assert!(status.ensure_assignable().is_err());
        }
    }

    #[test]
    fn only_completion_blocks_writes() {
        assert!(SessionStatus::Waiting.ensure_accepts_writes().is_ok());
        assert!(SessionStatus::InProgress.ensure_accepts_writes().is_ok());
        assert_eq!(
            SessionStatus::Completed.ensure_accepts_writes(),
            Err(LifecycleError::Completed)
        );
    }

    #[test]
    fn wire_strings_round_trip() {
        for status in [
            SessionStatus::Waiting,
            SessionStatus::InProgress,
            SessionStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!("paused".parse::<SessionStatus>().is_err());
    }
}
