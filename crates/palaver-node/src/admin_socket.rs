//! Unix socket server for facilitator commands.
//!
//! Provides a local IPC interface for driving a session from the host
//! machine: open it, watch the lobby fill, seat the roster, start and
//! end the negotiation, and pull the debrief. The `palaver-admin` CLI
//! speaks this protocol.

use crate::error::Result;
use crate::models::{Participant, Session, Team};
use crate::service::{Debrief, Seating, SessionService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Facilitator command sent over the socket.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Open a session (optional timer override, in seconds)
    CreateSession { timer_duration: Option<u64> },
    /// List every session on record
    Sessions,
    /// Session status and clock
    Status { session_id: String },
    /// Roster in join order, with the team records
    Participants { session_id: String },
    /// Form teams and seat the whole roster
    AssignRoles { session_id: String },
    /// Start the negotiation
    Start { session_id: String },
    /// End the session and free its join code
    End { session_id: String },
    /// Per-team answers and activity
    Debrief { session_id: String },
    /// Ping (health check)
    Ping,
}

/// Response from a facilitator command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Error { error: String },
    Session { session: Session },
    SessionList { sessions: Vec<Session> },
    Roster {
        participants: Vec<Participant>,
        teams: Vec<Team>,
    },
    Seated { seating: Seating },
    DebriefReport { debrief: Debrief },
    Pong,
}

/// Facilitator socket server.
pub struct AdminSocket {
    service: Arc<SessionService>,
    socket_path: String,
}

impl AdminSocket {
    /// Create a new facilitator socket server.
    pub fn new(service: Arc<SessionService>, socket_path: &str) -> Self {
        Self {
            service,
            socket_path: socket_path.to_string(),
        }
    }

    /// Run the facilitator socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove existing socket file if present
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let service = Arc::clone(&self.service);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, service).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }
}

async fn handle_connection(stream: UnixStream, service: Arc<SessionService>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &service),
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

fn execute_command(cmd: AdminCommand, service: &Arc<SessionService>) -> AdminResponse {
    match cmd {
        AdminCommand::CreateSession { timer_duration } => {
            match service.create_session(timer_duration) {
                Ok(session) => AdminResponse::Session { session },
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::Sessions => match service.sessions() {
            Ok(sessions) => AdminResponse::SessionList { sessions },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Status { session_id } => match service.require_session(&session_id) {
            Ok(session) => AdminResponse::Session { session },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Participants { session_id } => {
            match roster_response(&session_id, service) {
                Ok(response) => response,
                Err(e) => AdminResponse::Error {
                    error: e.to_string(),
                },
            }
        }

        AdminCommand::AssignRoles { session_id } => match service.assign_roles(&session_id) {
            Ok(seating) => AdminResponse::Seated { seating },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Start { session_id } => match service.start_session(&session_id) {
            Ok(session) => AdminResponse::Session { session },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::End { session_id } => match service.end_session(&session_id) {
            Ok(session) => AdminResponse::Session { session },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Debrief { session_id } => match service.debrief(&session_id) {
            Ok(debrief) => AdminResponse::DebriefReport { debrief },
            Err(e) => AdminResponse::Error {
                error: e.to_string(),
            },
        },

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

fn roster_response(session_id: &str, service: &Arc<SessionService>) -> Result<AdminResponse> {
    service.require_session(session_id)?;
    Ok(AdminResponse::Roster {
        participants: service.roster(session_id)?,
        teams: service.teams(session_id)?,
    })
}

/// Default socket path.
pub fn default_socket_path() -> String {
    let data_dir =
        std::env::var("PALAVER_DATA_DIR").unwrap_or_else(|_| "./palaver-data".to_string());
    format!("{}/admin.sock", data_dir)
}
