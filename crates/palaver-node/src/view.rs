//! A cached picture of one session, and how it reacts to change
//! notifications.
//!
//! A view holds three things: the session record, the roster, and a
//! transcript. With a viewer it is a participant's screen, watching
//! that participant's team channel; without one it is the facilitator's
//! monitor, watching every channel. [`SessionView::apply`] folds one
//! notification into the cache and answers with an [`Outcome`]: apply
//! in place when the event is self-contained, ask for a refetch when
//! the cache cannot reconcile (a membership change it never saw, or the
//! viewer's own seat moving to a new channel), and flag terminal
//! completion so the client can leave the table. The socket layer runs
//! the same function server-side to keep per-connection state honest.
//!
//! Rendering is the other half: a transcript is stored verbatim and
//! distorted per viewer at display time, so the same channel reads
//! differently from a native and a non-native seat.

use rand::Rng;
use serde::Serialize;

use palaver_core::{garble_message, role_color, Role};

use crate::events::RecordEvent;
use crate::models::{ChatMessage, Participant, Session};

/// What the cache should do after folding in one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cache updated in place.
    Applied,
    /// Session reached its terminal state; leave the live view.
    SessionCompleted,
    /// Cache cannot reconcile this event; reload from the API.
    Refetch(&'static str),
    /// Event was not for this view.
    Ignored,
}

/// One transcript line as a particular viewer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct PerspectiveMessage {
    pub message_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: Option<Role>,
    pub sender_color: &'static str,
    pub content: String,
    pub is_code_switched: bool,
    pub timestamp: u64,
}

/// Render one message for one viewer.
///
/// With no viewer (the facilitator's monitor) the content is verbatim.
/// An unknown sender renders verbatim too: fluency unknown means no
/// barrier to apply yet.
pub fn render_for_viewer<R: Rng + ?Sized>(
    message: &ChatMessage,
    sender: Option<&Participant>,
    viewer: Option<&Participant>,
    rng: &mut R,
) -> PerspectiveMessage {
    let content = match viewer {
        None => message.content.clone(),
        Some(viewer) => garble_message(
            &message.content,
            sender.and_then(|s| s.is_native_speaker),
            viewer.is_native_speaker,
            message.is_code_switched,
            rng,
        ),
    };
    let sender_role = sender.and_then(|s| s.role);
    PerspectiveMessage {
        message_id: message.id.clone(),
        sender_id: message.participant_id.clone(),
        sender_name: sender
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        sender_role,
        sender_color: role_color(sender_role),
        content,
        is_code_switched: message.is_code_switched,
        timestamp: message.timestamp,
    }
}

/// A client-side cache of one session. `viewer_id` selects between a
/// participant's screen and the facilitator's monitor.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: Session,
    roster: Vec<Participant>,
    transcript: Vec<ChatMessage>,
    viewer_id: Option<String>,
}

impl SessionView {
    /// Build a view from a snapshot. Roster and transcript are sorted
    /// into their canonical orders regardless of how they arrived.
    pub fn new(
        session: Session,
        mut roster: Vec<Participant>,
        mut transcript: Vec<ChatMessage>,
        viewer_id: Option<String>,
    ) -> Self {
        roster.sort_by(|a, b| (a.joined_at, &a.id).cmp(&(b.joined_at, &b.id)));
        transcript.sort_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)));
        Self {
            session,
            roster,
            transcript,
            viewer_id,
        }
    }

    /// The whole session roster, join order.
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// The watched channel's transcript, send order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// The participant whose eyes this view renders through, or `None`
    /// for the facilitator's monitor.
    pub fn viewer(&self) -> Option<&Participant> {
        let id = self.viewer_id.as_deref()?;
        self.roster.iter().find(|p| p.id == id)
    }

    /// The team channel a seated viewer watches. `None` both for an
    /// unseated viewer and for the monitor (which filters nothing).
    pub fn channel(&self) -> Option<&str> {
        self.viewer()?.team_id.as_deref()
    }

    /// Whether a message on the given team belongs in this transcript.
    fn watches(&self, team_id: &str) -> bool {
        match self.viewer_id {
            // The monitor watches every channel.
            None => true,
            Some(_) => self.channel() == Some(team_id),
        }
    }

    /// Seconds left on the negotiation clock.
    pub fn remaining_secs(&self, now_ms: u64) -> Option<u64> {
        self.session.remaining_secs(now_ms)
    }

    /// Fold one notification into the cache.
    pub fn apply(&mut self, event: &RecordEvent) -> Outcome {
        if event.session_id() != self.session.id {
            return Outcome::Ignored;
        }
        match event {
            RecordEvent::SessionUpdated { session } => {
                self.session = session.clone();
                if session.status.is_terminal() {
                    Outcome::SessionCompleted
                } else {
                    Outcome::Applied
                }
            }
            RecordEvent::ParticipantInserted { participant } => {
                // Duplicate delivery is fine; the record is already here.
                if self.roster.iter().any(|p| p.id == participant.id) {
                    return Outcome::Applied;
                }
                let at = self
                    .roster
                    .partition_point(|p| (p.joined_at, &p.id) < (participant.joined_at, &participant.id));
                self.roster.insert(at, participant.clone());
                Outcome::Applied
            }
            RecordEvent::ParticipantUpdated { participant } => {
                let Some(index) = self.roster.iter().position(|p| p.id == participant.id) else {
                    return Outcome::Refetch("update for a participant this view never saw");
                };
                let own_channel_moved = self.viewer_id.as_deref() == Some(participant.id.as_str())
                    && self.roster[index].team_id != participant.team_id;
                self.roster[index] = participant.clone();
                if own_channel_moved {
                    // The transcript on hand belongs to the old channel.
                    self.transcript.clear();
                    Outcome::Refetch("viewer was seated; transcript channel changed")
                } else {
                    Outcome::Applied
                }
            }
            RecordEvent::MessageInserted { message } => {
                if !self.watches(&message.team_id) {
                    return Outcome::Ignored;
                }
                if self.transcript.iter().any(|m| m.id == message.id) {
                    return Outcome::Applied;
                }
                let at = self
                    .transcript
                    .partition_point(|m| (m.timestamp, &m.id) < (message.timestamp, &message.id));
                self.transcript.insert(at, message.clone());
                Outcome::Applied
            }
        }
    }

    /// Render the whole transcript through the viewer's eyes.
    pub fn render_transcript<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<PerspectiveMessage> {
        let viewer = self.viewer();
        self.transcript
            .iter()
            .map(|message| {
                let sender = self.roster.iter().find(|p| p.id == message.participant_id);
                render_for_viewer(message, sender, viewer, rng)
            })
            .collect()
    }

    /// Render one message through the viewer's eyes.
    pub fn render_message<R: Rng + ?Sized>(
        &self,
        message: &ChatMessage,
        rng: &mut R,
    ) -> PerspectiveMessage {
        let sender = self.roster.iter().find(|p| p.id == message.participant_id);
        render_for_viewer(message, sender, self.viewer(), rng)
    }
}
