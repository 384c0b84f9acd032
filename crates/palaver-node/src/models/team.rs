//! Team record - one negotiation team within a session.

use serde::{Deserialize, Serialize};

/// A team of 4-5 participants, numbered in formation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    /// Unique identifier
    pub id: String,

    /// Owning session
    pub session_id: String,

    /// 1-based number shown to participants ("Team 2")
    pub team_number: u32,

    /// Formation instant, unix ms
    pub created_at: u64,
}

impl Team {
    pub fn new(id: String, session_id: String, team_number: u32, created_at: u64) -> Self {
        Self {
            id,
            session_id,
            team_number,
            created_at,
        }
    }
}
