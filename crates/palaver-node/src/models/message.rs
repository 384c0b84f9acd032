//! Chat message record.
//!
//! Messages are stored exactly as typed. The fluency barrier is applied
//! per viewer at render time, never at write time, so the debrief can
//! replay any team's negotiation from any seat's perspective.

use serde::{Deserialize, Serialize};

/// One line of team chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Unique identifier
    pub id: String,

    /// Owning session
    pub session_id: String,

    /// Team channel the message belongs to
    pub team_id: String,

    /// Sender
    pub participant_id: String,

    /// Verbatim text as typed
    pub content: String,

    /// Sent in the non-native speakers' own language
    pub is_code_switched: bool,

    /// Send instant, unix ms (transcript order)
    pub timestamp: u64,
}

impl ChatMessage {
    pub fn new(
        id: String,
        session_id: String,
        team_id: String,
        participant_id: String,
        content: String,
        is_code_switched: bool,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            session_id,
            team_id,
            participant_id,
            content,
            is_code_switched,
            timestamp,
        }
    }
}
