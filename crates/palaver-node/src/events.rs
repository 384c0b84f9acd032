//! Change notifications.
//!
//! Every committed write that clients watch is announced on a broadcast
//! channel, in commit order. Three record kinds are announced: sessions,
//! participants, and messages. Teams and answers change only as part of
//! operations that already announce one of the three, so clients refetch
//! those on the triggering notification instead of listening for them.
//!
//! Delivery is at-least-once from the subscriber's point of view: a slow
//! subscriber can lag out of the channel, and the socket layer answers a
//! lag by resending a full snapshot rather than replaying what was lost.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{ChatMessage, Participant, Session};

/// A committed write, announced to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordEvent {
    /// Session record changed (start, end, or other field updates)
    SessionUpdated { session: Session },
    /// A participant joined the roster
    ParticipantInserted { participant: Participant },
    /// A participant record changed (seating, typically)
    ParticipantUpdated { participant: Participant },
    /// A chat message was committed
    MessageInserted { message: ChatMessage },
}

impl RecordEvent {
    /// Session the event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            RecordEvent::SessionUpdated { session } => &session.id,
            RecordEvent::ParticipantInserted { participant }
            | RecordEvent::ParticipantUpdated { participant } => &participant.session_id,
            RecordEvent::MessageInserted { message } => &message.session_id,
        }
    }

    /// Team channel the event belongs to, where one applies.
    pub fn team_id(&self) -> Option<&str> {
        match self {
            RecordEvent::SessionUpdated { .. } => None,
            RecordEvent::ParticipantInserted { participant }
            | RecordEvent::ParticipantUpdated { participant } => participant.team_id.as_deref(),
            RecordEvent::MessageInserted { message } => Some(&message.team_id),
        }
    }
}

/// Broadcast hub connecting the service to every open socket.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<RecordEvent>,
}

impl EventHub {
    /// Create a hub. Capacity bounds how far a subscriber may fall
    /// behind before it lags out and must resnapshot.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.tx.subscribe()
    }

    /// Announce an event. A send with no subscribers is not an error;
    /// sessions run fine with nobody watching.
    pub fn publish(&self, event: RecordEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        // Room for a full workshop burst: every team chatting at once.
        Self::new(1024)
    }
}
