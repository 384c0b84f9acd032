//! HTTP API for the Palaver node.

use crate::error::Error;
use crate::models::{Answer, ChatMessage, Participant, Session, Team, BRIEFING_QUESTIONS};
use crate::service::{AnswerEntry, Seating, SessionService};
use crate::view::{render_for_viewer, PerspectiveMessage};
use crate::ws::ws_session_handler;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub type AppState = Arc<SessionService>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health (at root and under /api/v1 for compatibility)
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        .route("/ready", get(ready))
        // Briefing question catalog
        .route("/api/v1/questions", get(list_questions))
        // Sessions
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/join", post(join_session))
        .route("/api/v1/sessions/by-pin/:pin", get(get_session_by_pin))
        .route("/api/v1/sessions/:id", get(get_session))
        .route("/api/v1/sessions/:id/assign-roles", post(assign_roles))
        .route("/api/v1/sessions/:id/start", post(start_session))
        .route("/api/v1/sessions/:id/end", post(end_session))
        // Roster and teams
        .route("/api/v1/sessions/:id/participants", get(list_participants))
        .route("/api/v1/sessions/:id/teams", get(list_teams))
        // Team chat (raw for the monitor, garbled with ?perspective=)
        .route(
            "/api/v1/sessions/:id/teams/:team_id/messages",
            get(list_team_messages),
        )
        .route("/api/v1/sessions/:id/messages", post(post_message))
        // Briefing answers
        .route("/api/v1/sessions/:id/answers", get(list_answers))
        .route("/api/v1/sessions/:id/answers", post(submit_answers))
        // WebSocket for real-time session updates
        .route("/api/v1/ws/sessions/:id", get(ws_session_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Error envelope ---

/// JSON body shipped with every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Wrapper mapping service errors onto status codes: validation 400,
/// precondition and race conflicts 409, missing records 404, the rest
/// 500.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Formation(_)
            | Error::JoinCode(_)
            | Error::Assign(_)
            | Error::EmptyName
            | Error::EmptyMessage
            | Error::QuestionOutOfRange(_) => StatusCode::BAD_REQUEST,
            Error::Lifecycle(_)
            | Error::RolesAlreadyAssigned
            | Error::NoTeam
            | Error::NotCeo { .. }
            | Error::RaceLost(_) => StatusCode::CONFLICT,
            Error::CodeNotFound(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Briefing question endpoints ---

#[derive(Debug, Serialize)]
struct QuestionEntry {
    number: u8,
    prompt: &'static str,
}

async fn list_questions() -> Json<Vec<QuestionEntry>> {
    let questions = BRIEFING_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, &prompt)| QuestionEntry {
            number: i as u8 + 1,
            prompt,
        })
        .collect();
    Json(questions)
}

// --- Session endpoints ---

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    timer_duration: Option<u64>,
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = state.create_session(req.timer_duration)?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    game_pin: String,
    name: String,
}

/// The joiner needs both their own record and the session it landed in.
#[derive(Debug, Serialize)]
struct JoinResponse {
    participant: Participant,
    session: Session,
}

async fn join_session(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> ApiResult<(StatusCode, Json<JoinResponse>)> {
    let participant = state.join(&req.game_pin, &req.name)?;
    let session = state.require_session(&participant.session_id)?;
    Ok((
        StatusCode::CREATED,
        Json(JoinResponse {
            participant,
            session,
        }),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.require_session(&id)?))
}

async fn get_session_by_pin(
    State(state): State<AppState>,
    Path(pin): Path<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.session_by_code(&pin)?))
}

async fn assign_roles(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Seating>> {
    Ok(Json(state.assign_roles(&id)?))
}

async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.start_session(&id)?))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.end_session(&id)?))
}

// --- Roster endpoints ---

async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Participant>>> {
    state.require_session(&id)?;
    Ok(Json(state.roster(&id)?))
}

async fn list_teams(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Team>>> {
    state.require_session(&id)?;
    Ok(Json(state.teams(&id)?))
}

// --- Team chat endpoints ---

#[derive(Debug, Deserialize)]
struct TranscriptQuery {
    /// Participant whose eyes to render through. Absent means the
    /// facilitator's raw view.
    perspective: Option<String>,
}

async fn list_team_messages(
    State(state): State<AppState>,
    Path((id, team_id)): Path<(String, String)>,
    Query(query): Query<TranscriptQuery>,
) -> ApiResult<Json<Vec<PerspectiveMessage>>> {
    state.require_session(&id)?;
    let roster = state.roster(&id)?;
    let viewer = match &query.perspective {
        Some(pid) => Some(state.require_participant(&id, pid)?),
        None => None,
    };
    let messages = state.team_messages(&id, &team_id)?;

    let mut rng = rand::thread_rng();
    let rendered = messages
        .iter()
        .map(|message| {
            let sender = roster.iter().find(|p| p.id == message.participant_id);
            render_for_viewer(message, sender, viewer.as_ref(), &mut rng)
        })
        .collect();
    Ok(Json(rendered))
}

#[derive(Debug, Deserialize)]
struct PostMessageRequest {
    participant_id: String,
    content: String,
    #[serde(default)]
    is_code_switched: bool,
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let message = state.post_message(&id, &req.participant_id, &req.content, req.is_code_switched)?;
    Ok((StatusCode::CREATED, Json(message)))
}

// --- Briefing answer endpoints ---

async fn list_answers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Answer>>> {
    state.require_session(&id)?;
    Ok(Json(state.session_answers(&id)?))
}

#[derive(Debug, Deserialize)]
struct SubmitAnswersRequest {
    participant_id: String,
    answers: Vec<AnswerEntry>,
}

async fn submit_answers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitAnswersRequest>,
) -> ApiResult<Json<Vec<Answer>>> {
    let saved = state.submit_answers(&id, &req.participant_id, &req.answers)?;
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn error_classes_map_to_distinct_status_codes() {
        assert_eq!(status_of(Error::EmptyName), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::Formation(palaver_core::plan(6).unwrap_err())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::RolesAlreadyAssigned),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::RaceLost("conditions changed")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::CodeNotFound("ZZZZZZ".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
