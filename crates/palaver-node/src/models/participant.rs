//! Participant record - a person in the session roster.

use palaver_core::{role_display_name, Role};
use serde::{Deserialize, Serialize};

/// A participant. Team, role, and fluency stay unset until the
/// facilitator assigns roles; the three are always set together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    /// Unique identifier
    pub id: String,

    /// Owning session
    pub session_id: String,

    /// Assigned team, once roles exist
    pub team_id: Option<String>,

    /// Display name, as entered at the door
    pub name: String,

    /// Executive role, once assigned
    pub role: Option<Role>,

    /// Whether this participant speaks the negotiation language natively
    pub is_native_speaker: Option<bool>,

    /// Join instant, unix ms (roster order)
    pub joined_at: u64,
}

impl Participant {
    /// Create an unseated participant in the lobby.
    pub fn new(id: String, session_id: String, name: String, joined_at: u64) -> Self {
        Self {
            id,
            session_id,
            team_id: None,
            name,
            role: None,
            is_native_speaker: None,
            joined_at,
        }
    }

    /// Seat this participant: team, role, and fluency land together.
    pub fn seat(&mut self, team_id: String, role: Role, is_native_speaker: bool) {
        self.team_id = Some(team_id);
        self.role = Some(role);
        self.is_native_speaker = Some(is_native_speaker);
    }

    pub fn is_seated(&self) -> bool {
        self.role.is_some()
    }

    pub fn is_ceo(&self) -> bool {
        self.role == Some(Role::Ceo)
    }

    /// Role label for displays, with the unassigned fallback.
    pub fn role_label(&self) -> &'static str {
        role_display_name(self.role)
    }
}
