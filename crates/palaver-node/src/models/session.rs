//! Session record - one run of the exercise.

use palaver_core::{remaining_secs, JoinCode, SessionStatus};
use serde::{Deserialize, Serialize};

/// A facilitated session, addressed by its join code while open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Unique identifier
    pub id: String,

    /// Join code participants enter (unique among non-completed sessions)
    pub game_pin: JoinCode,

    /// Lifecycle state
    pub status: SessionStatus,

    /// Negotiation length in seconds
    pub timer_duration: u64,

    /// Creation instant, unix ms
    pub created_at: u64,

    /// Set once by the start transition
    pub started_at: Option<u64>,

    /// Set once by the end transition
    pub ended_at: Option<u64>,
}

impl Session {
    /// Create a session in the lobby.
    pub fn new(id: String, game_pin: JoinCode, timer_duration: u64, created_at: u64) -> Self {
        Self {
            id,
            game_pin,
            status: SessionStatus::Waiting,
            timer_duration,
            created_at,
            started_at: None,
            ended_at: None,
        }
    }

    /// Seconds left on the negotiation clock, or `None` before the start.
    pub fn remaining_secs(&self, now_ms: u64) -> Option<u64> {
        self.started_at
            .map(|started| remaining_secs(now_ms, started, self.timer_duration))
    }
}
