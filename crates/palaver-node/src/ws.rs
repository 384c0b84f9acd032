//! WebSocket streaming for live session updates.
//!
//! Every connected client - participant screens and the facilitator's
//! monitor - holds a [`SessionView`] server-side. On connect the client
//! gets a full snapshot; afterwards each committed write arrives as one
//! event, already rendered for that viewer's perspective. When the view
//! cannot merge an event (or the subscriber lags behind the broadcast
//! channel) the server sends a fresh snapshot instead of a partial
//! patch.
//!
//! ```text
//! ┌──────────────┐      WebSocket       ┌──────────────┐
//! │ Participant  │ ←──────────────────→ │ Palaver node │
//! │   screens    │   snapshot + events  │  ┌────────┐  │
//! └──────────────┘                      │  │ Event  │  │
//! ┌──────────────┐                      │  │  hub   │←─┼── SessionService
//! │ Facilitator  │ ←──────────────────→ │  └────────┘  │
//! │   monitor    │                      └──────────────┘
//! └──────────────┘
//! ```
//!
//! Connect to `/api/v1/ws/sessions/:id?viewer={participant_id}`; omit
//! `viewer` for the facilitator's raw monitor. A 1 Hz heartbeat carries
//! the server clock so countdown displays converge.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::api::AppState;
use crate::error::Result;
use crate::events::RecordEvent;
use crate::models::{now_ms, Participant, Session};
use crate::view::{Outcome, PerspectiveMessage, SessionView};

/// WebSocket message types for session updates
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Initial state, and the replacement after any unmergeable change
    Snapshot {
        session: Session,
        participants: Vec<Participant>,
        messages: Vec<PerspectiveMessage>,
    },
    /// Session record changed (start, clock fields)
    SessionChanged { session: Session },
    /// Someone entered the lobby
    ParticipantJoined { participant: Participant },
    /// A roster record changed (seating)
    ParticipantChanged { participant: Participant },
    /// New message on the watched channel, rendered for this viewer
    MessageReceived { message: PerspectiveMessage },
    /// The session reached its terminal state
    SessionCompleted { session: Session },
    /// Server clock, for countdown convergence
    Heartbeat {
        timestamp: u64,
        remaining_secs: Option<u64>,
    },
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Participant whose perspective to render through; absent for the
    /// facilitator's raw monitor.
    pub viewer: Option<String>,
}

/// WebSocket handler for session updates
pub async fn ws_session_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, state, id, query.viewer))
}

/// Handle one WebSocket connection for session updates
async fn handle_session_socket(
    mut socket: WebSocket,
    state: AppState,
    session_id: String,
    viewer: Option<String>,
) {
    info!(session = %session_id, "WebSocket client connected for session updates");

    // Subscribe before the snapshot read; events committed in between
    // re-apply cleanly on top of it.
    let mut rx = state.hub().subscribe();

    let mut view = match build_view(&state, &session_id, viewer.clone()) {
        Ok(view) => view,
        Err(e) => {
            warn!("Failed to load session for WebSocket client: {}", e);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    if let Err(e) = send_event(&mut socket, snapshot_event(&view)).await {
        warn!("Failed to send initial snapshot: {}", e);
        return;
    }

    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            // Handle incoming messages from the client
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received from client: {}", text);
                        // Clients send nothing the server acts on; writes go
                        // through the HTTP API.
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session = %session_id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            // Forward committed writes, folded through the view
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let reply = match view.apply(&event) {
                            Outcome::Ignored => None,
                            Outcome::Applied => Some(applied_event(&view, event)),
                            Outcome::SessionCompleted => Some(SessionEvent::SessionCompleted {
                                session: view.session.clone(),
                            }),
                            Outcome::Refetch(reason) => {
                                debug!("Session view could not merge an event ({}); refetching", reason);
                                match build_view(&state, &session_id, viewer.clone()) {
                                    Ok(fresh) => {
                                        view = fresh;
                                        Some(snapshot_event(&view))
                                    }
                                    Err(e) => {
                                        error!("Failed to rebuild session view: {}", e);
                                        break;
                                    }
                                }
                            }
                        };
                        if let Some(reply) = reply {
                            if let Err(e) = send_event(&mut socket, reply).await {
                                warn!("Failed to forward session event: {}", e);
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("WebSocket subscriber lagged by {} events; resending snapshot", missed);
                        match build_view(&state, &session_id, viewer.clone()) {
                            Ok(fresh) => {
                                view = fresh;
                                if let Err(e) = send_event(&mut socket, snapshot_event(&view)).await {
                                    warn!("Failed to send snapshot after lag: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Failed to rebuild session view: {}", e);
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // 1 Hz server clock
            _ = interval.tick() => {
                let now = now_ms();
                let heartbeat = SessionEvent::Heartbeat {
                    timestamp: now,
                    remaining_secs: view.remaining_secs(now),
                };
                if let Err(e) = send_event(&mut socket, heartbeat).await {
                    warn!("Failed to send heartbeat: {}", e);
                    break;
                }
            }
        }
    }
}

/// Load a fresh view for one connection: the session, the roster, and
/// the transcript this viewer is entitled to watch.
fn build_view(state: &AppState, session_id: &str, viewer: Option<String>) -> Result<SessionView> {
    let session = state.require_session(session_id)?;
    let roster = state.roster(session_id)?;
    let transcript = match &viewer {
        Some(pid) => {
            let participant = state.require_participant(session_id, pid)?;
            match participant.team_id.as_deref() {
                Some(team_id) => state.team_messages(session_id, team_id)?,
                // Not seated yet; no channel to watch.
                None => Vec::new(),
            }
        }
        None => state.session_messages(session_id)?,
    };
    Ok(SessionView::new(session, roster, transcript, viewer))
}

/// Render the view's current state as a snapshot event.
fn snapshot_event(view: &SessionView) -> SessionEvent {
    let mut rng = rand::thread_rng();
    SessionEvent::Snapshot {
        session: view.session.clone(),
        participants: view.roster().to_vec(),
        messages: view.render_transcript(&mut rng),
    }
}

/// Map an applied record event onto the wire event for this viewer.
fn applied_event(view: &SessionView, event: RecordEvent) -> SessionEvent {
    match event {
        RecordEvent::SessionUpdated { session } => SessionEvent::SessionChanged { session },
        RecordEvent::ParticipantInserted { participant } => {
            SessionEvent::ParticipantJoined { participant }
        }
        RecordEvent::ParticipantUpdated { participant } => {
            SessionEvent::ParticipantChanged { participant }
        }
        RecordEvent::MessageInserted { message } => {
            let mut rng = rand::thread_rng();
            SessionEvent::MessageReceived {
                message: view.render_message(&message, &mut rng),
            }
        }
    }
}

/// Send a session event over WebSocket
async fn send_event(socket: &mut WebSocket, event: SessionEvent) -> std::result::Result<(), axum::Error> {
    let json = serde_json::to_string(&event).map_err(|e| {
        axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    socket.send(Message::Text(json)).await.map_err(axum::Error::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use palaver_core::{JoinCode, Role};

    fn session() -> Session {
        Session::new("s1".into(), JoinCode::parse("AB12CD").unwrap(), 900, 1_000)
    }

    fn seated(id: &str, joined_at: u64, team: &str, role: Role, native: bool) -> Participant {
        let mut p = Participant::new(id.into(), "s1".into(), format!("Name {id}"), joined_at);
        p.seat(team.into(), role, native);
        p
    }

    fn monitor_view(messages: Vec<ChatMessage>) -> SessionView {
        let roster = vec![
            seated("p1", 10, "t1", Role::Ceo, true),
            seated("p2", 20, "t1", Role::VpFinance, false),
        ];
        SessionView::new(session(), roster, messages, None)
    }

    #[test]
    fn events_carry_snake_case_type_tags() {
        let heartbeat = SessionEvent::Heartbeat {
            timestamp: 42,
            remaining_secs: Some(900),
        };
        let json = serde_json::to_value(&heartbeat).unwrap();
        assert_eq!(json["type"], "heartbeat");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["remaining_secs"], 900);

        let completed = SessionEvent::SessionCompleted { session: session() };
        let json = serde_json::to_value(&completed).unwrap();
        assert_eq!(json["type"], "session_completed");
    }

    #[test]
    fn snapshots_carry_the_whole_view() {
        let message = ChatMessage::new(
            "m1".into(),
            "s1".into(),
            "t1".into(),
            "p1".into(),
            "Opening offer stands".into(),
            false,
            100,
        );
        let view = monitor_view(vec![message]);
        let SessionEvent::Snapshot {
            session,
            participants,
            messages,
        } = snapshot_event(&view)
        else {
            panic!("expected a snapshot");
        };
        assert_eq!(session.id, "s1");
        assert_eq!(participants.len(), 2);
        // The monitor reads verbatim.
        assert_eq!(messages[0].content, "Opening offer stands");
        assert_eq!(messages[0].sender_name, "Name p1");
    }

    #[test]
    fn applied_record_events_map_onto_wire_events() {
        let view = monitor_view(Vec::new());

        let event = applied_event(
            &view,
            RecordEvent::SessionUpdated { session: session() },
        );
        assert!(matches!(event, SessionEvent::SessionChanged { .. }));

        let message = ChatMessage::new(
            "m1".into(),
            "s1".into(),
            "t1".into(),
            "p2".into(),
            "Numbers hold at 40".into(),
            false,
            100,
        );
        let event = applied_event(&view, RecordEvent::MessageInserted { message });
        let SessionEvent::MessageReceived { message } = event else {
            panic!("expected a rendered message");
        };
        assert_eq!(message.sender_role, Some(Role::VpFinance));
        assert_eq!(message.content, "Numbers hold at 40");
    }
}
