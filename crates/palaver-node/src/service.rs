//! Session operations.
//!
//! Every write to a session goes through this service, which owns the
//! guard discipline:
//!
//! 1. **Optimistic pass** (no lock): validate the request and probe the
//!    preconditions against a snapshot read. Failures here surface as
//!    validation or precondition errors.
//! 2. **Definitive pass** (under the write gate): re-read and re-check,
//!    then commit and announce. A precondition that held in the first
//!    pass but fails here means another writer got in between; that
//!    surfaces as [`Error::RaceLost`] so callers can distinguish "you
//!    never could" from "someone beat you to it".
//!
//! The gate is a plain mutex: operations are short, synchronous reads
//! and writes, and serializing them makes the re-checks conclusive. Hub
//! announcements happen inside the gate, so subscribers observe events
//! in commit order.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use serde::{Deserialize, Serialize};

use palaver_core::{assign, plan, JoinCode, DEFAULT_TIMER_DURATION_SECS};

use crate::error::{Error, Result};
use crate::events::{EventHub, RecordEvent};
use crate::models::{
    now_ms, record_id, valid_question_number, Answer, ChatMessage, Participant, Session, Team,
};
use crate::storage::Storage;

/// Attempts to draw an unused join code before giving up. The code space
/// holds 36^6 values, so hitting this bound means something is wrong.
const CODE_DRAW_ATTEMPTS: usize = 64;

/// What a seating pass produced: the team records and the full seated
/// roster, in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seating {
    pub teams: Vec<Team>,
    pub participants: Vec<Participant>,
}

/// One answer in a submission batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_number: u8,
    pub answer_text: String,
}

/// Per-team debrief material for the facilitator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDebrief {
    pub team: Team,
    pub members: Vec<Participant>,
    pub answers: Vec<Answer>,
    pub message_count: usize,
}

/// Full debrief for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debrief {
    pub session: Session,
    pub teams: Vec<TeamDebrief>,
}

/// The single writer for session state.
pub struct SessionService {
    storage: Arc<Storage>,
    hub: EventHub,
    write_gate: Mutex<()>,
}

impl SessionService {
    pub fn new(storage: Arc<Storage>, hub: EventHub) -> Self {
        Self {
            storage,
            hub,
            write_gate: Mutex::new(()),
        }
    }

    /// The hub this service announces commits on.
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        // A poisoned gate only means a panic mid-operation; the next
        // writer re-reads everything anyway.
        self.write_gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    // --- Session lifecycle ---

    /// Open a session in the lobby with a fresh join code.
    pub fn create_session(&self, timer_duration: Option<u64>) -> Result<Session> {
        let duration = timer_duration.unwrap_or(DEFAULT_TIMER_DURATION_SECS);

        let _guard = self.gate();
        let mut rng = rand::thread_rng();
        let code = self.draw_code(&mut rng)?;
        let created_at = now_ms();
        let id = record_id("session", code.as_str(), created_at, rng.gen());
        let session = Session::new(id, code.clone(), duration, created_at);

        self.storage.put_session(&session)?;
        self.storage.bind_code(&code, &session.id)?;
        self.hub.publish(RecordEvent::SessionUpdated {
            session: session.clone(),
        });
        tracing::info!(session = %session.id, code = %code, "session created");
        Ok(session)
    }

    /// Draw a code no open session holds. Codes bound to completed
    /// sessions are reclaimable; completion normally releases the
    /// binding, but a crash between the two writes can leave one behind.
    fn draw_code<R: Rng>(&self, rng: &mut R) -> Result<JoinCode> {
        for _ in 0..CODE_DRAW_ATTEMPTS {
            let code = JoinCode::generate(rng);
            match self.storage.session_id_for_code(&code)? {
                None => return Ok(code),
                Some(holder) => match self.storage.get_session(&holder)? {
                    Some(session) if !session.status.is_terminal() => continue,
                    _ => return Ok(code),
                },
            }
        }
        Err(Error::Storage(
            "could not draw an unused join code; end stale sessions".to_string(),
        ))
    }

    /// Start the negotiation: lobby to live, clock begins.
    pub fn start_session(&self, session_id: &str) -> Result<Session> {
        let session = self.require_session(session_id)?;
        session.status.start()?;

        let _guard = self.gate();
        let mut current = self
            .storage
            .get_session(session_id)?
            .ok_or(Error::RaceLost("session disappeared before start"))?;
        let Ok(next) = current.status.start() else {
            return Err(Error::RaceLost("session was started or ended concurrently"));
        };
        current.status = next;
        current.started_at = Some(now_ms());

        self.storage.put_session(&current)?;
        self.hub.publish(RecordEvent::SessionUpdated {
            session: current.clone(),
        });
        tracing::info!(session = %current.id, duration = current.timer_duration, "negotiation started");
        Ok(current)
    }

    /// End the session: live to completed, join code released for reuse.
    pub fn end_session(&self, session_id: &str) -> Result<Session> {
        let session = self.require_session(session_id)?;
        session.status.end()?;

        let _guard = self.gate();
        let mut current = self
            .storage
            .get_session(session_id)?
            .ok_or(Error::RaceLost("session disappeared before end"))?;
        let Ok(next) = current.status.end() else {
            return Err(Error::RaceLost("session was ended concurrently"));
        };
        current.status = next;
        current.ended_at = Some(now_ms());

        self.storage.put_session(&current)?;
        self.storage.release_code(&current.game_pin)?;
        self.hub.publish(RecordEvent::SessionUpdated {
            session: current.clone(),
        });
        tracing::info!(session = %current.id, code = %current.game_pin, "session completed, join code released");
        Ok(current)
    }

    // --- Roster ---

    /// Admit a participant through a join code.
    pub fn join(&self, code_input: &str, name: &str) -> Result<Participant> {
        let code = JoinCode::parse(code_input)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let session = self
            .storage
            .get_session_by_code(&code)?
            .ok_or_else(|| Error::CodeNotFound(code.to_string()))?;
        session.status.ensure_joinable()?;

        let _guard = self.gate();
        let current = self
            .storage
            .get_session(&session.id)?
            .ok_or(Error::RaceLost("session disappeared while joining"))?;
        if current.status.ensure_joinable().is_err() {
            return Err(Error::RaceLost("session left the lobby while joining"));
        }

        let mut rng = rand::thread_rng();
        let joined_at = now_ms();
        let id = record_id("participant", &session.id, joined_at, rng.gen());
        let participant = Participant::new(id, session.id.clone(), name.to_string(), joined_at);

        self.storage.put_participant(&participant)?;
        self.hub.publish(RecordEvent::ParticipantInserted {
            participant: participant.clone(),
        });
        tracing::info!(session = %session.id, participant = %participant.id, name = %participant.name, "participant joined");
        Ok(participant)
    }

    /// Form teams and seat the whole roster. One-shot per session.
    ///
    /// Teams are planned from the roster size, then participants are
    /// dealt into seats in join order. Everything commits in one pass
    /// under the gate, so observers never see a half-seated roster.
    pub fn assign_roles(&self, session_id: &str) -> Result<Seating> {
        let session = self.require_session(session_id)?;
        session.status.ensure_assignable()?;
        let roster = self.storage.list_participants(session_id)?;
        if roster.iter().any(Participant::is_seated) {
            return Err(Error::RolesAlreadyAssigned);
        }
        plan(roster.len())?;

        let _guard = self.gate();
        let current = self
            .storage
            .get_session(session_id)?
            .ok_or(Error::RaceLost("session disappeared during seating"))?;
        if current.status.ensure_assignable().is_err() {
            return Err(Error::RaceLost("session left the lobby during seating"));
        }
        let roster = self.storage.list_participants(session_id)?;
        if roster.iter().any(Participant::is_seated) {
            return Err(Error::RaceLost("roles were assigned concurrently"));
        }
        // The roster may have grown since the optimistic pass; plan from
        // what is actually there now.
        let sizes = plan(roster.len())?;
        let seats = assign(&sizes)?;

        let now = now_ms();
        let mut rng = rand::thread_rng();
        let mut teams = Vec::with_capacity(sizes.len());
        for number in 1..=sizes.len() as u32 {
            let seed = format!("{session_id}:{number}");
            let id = record_id("team", &seed, now, rng.gen());
            teams.push(Team::new(id, session_id.to_string(), number, now));
        }

        let mut seated = Vec::with_capacity(roster.len());
        for (mut participant, seat) in roster.into_iter().zip(seats) {
            let team = &teams[(seat.team_number - 1) as usize];
            participant.seat(team.id.clone(), seat.role, seat.is_native_speaker);
            seated.push(participant);
        }

        for team in &teams {
            self.storage.put_team(team)?;
        }
        for participant in &seated {
            self.storage.put_participant(participant)?;
            self.hub.publish(RecordEvent::ParticipantUpdated {
                participant: participant.clone(),
            });
        }
        tracing::info!(
            session = %session_id,
            teams = teams.len(),
            participants = seated.len(),
            "roster seated"
        );
        Ok(Seating {
            teams,
            participants: seated,
        })
    }

    // --- Team chat ---

    /// Commit a chat message to the sender's team channel.
    ///
    /// Content is stored verbatim; only an all-whitespace body is
    /// rejected. The sender must be seated, and the session must not
    /// have completed.
    pub fn post_message(
        &self,
        session_id: &str,
        participant_id: &str,
        content: &str,
        is_code_switched: bool,
    ) -> Result<ChatMessage> {
        if content.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        let session = self.require_session(session_id)?;
        session.status.ensure_accepts_writes()?;
        let participant = self.require_participant(session_id, participant_id)?;
        let team_id = participant.team_id.clone().ok_or(Error::NoTeam)?;

        let _guard = self.gate();
        let current = self
            .storage
            .get_session(session_id)?
            .ok_or(Error::RaceLost("session disappeared while sending"))?;
        if current.status.ensure_accepts_writes().is_err() {
            return Err(Error::RaceLost("session completed while sending"));
        }

        let mut rng = rand::thread_rng();
        let timestamp = now_ms();
        let id = record_id("message", &team_id, timestamp, rng.gen());
        let message = ChatMessage::new(
            id,
            session_id.to_string(),
            team_id,
            participant.id,
            content.to_string(),
            is_code_switched,
            timestamp,
        );

        self.storage.put_message(&message)?;
        self.hub.publish(RecordEvent::MessageInserted {
            message: message.clone(),
        });
        tracing::debug!(session = %session_id, team = %message.team_id, message = %message.id, "message committed");
        Ok(message)
    }

    // --- Briefing answers ---

    /// Upsert a batch of briefing answers for the submitter's team.
    /// CEO-only; one answer slot per question per team.
    pub fn submit_answers(
        &self,
        session_id: &str,
        participant_id: &str,
        entries: &[AnswerEntry],
    ) -> Result<Vec<Answer>> {
        for entry in entries {
            if !valid_question_number(entry.question_number) {
                return Err(Error::QuestionOutOfRange(entry.question_number));
            }
        }
        let session = self.require_session(session_id)?;
        session.status.ensure_accepts_writes()?;
        let participant = self.require_participant(session_id, participant_id)?;
        let team_id = participant.team_id.clone().ok_or(Error::NoTeam)?;
        if !participant.is_ceo() {
            return Err(Error::NotCeo {
                role: participant.role_label(),
            });
        }

        let _guard = self.gate();
        let current = self
            .storage
            .get_session(session_id)?
            .ok_or(Error::RaceLost("session disappeared while submitting"))?;
        if current.status.ensure_accepts_writes().is_err() {
            return Err(Error::RaceLost("session completed while submitting answers"));
        }

        let mut rng = rand::thread_rng();
        let submitted_at = now_ms();
        let mut saved = Vec::with_capacity(entries.len());
        for entry in entries {
            let seed = format!("{team_id}:{}", entry.question_number);
            let id = record_id("answer", &seed, submitted_at, rng.gen());
            let answer = Answer::new(
                id,
                session_id.to_string(),
                team_id.clone(),
                entry.question_number,
                entry.answer_text.clone(),
                participant.id.clone(),
                submitted_at,
            );
            self.storage.put_answer(&answer)?;
            saved.push(answer);
        }
        tracing::info!(session = %session_id, team = %team_id, count = saved.len(), "answers submitted");
        Ok(saved)
    }

    // --- Reads ---

    /// Session by ID, or a not-found error.
    pub fn require_session(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get_session(session_id)?
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))
    }

    /// Session by join code, or a code-not-found error. Completed
    /// sessions have released their code and no longer resolve.
    pub fn session_by_code(&self, code_input: &str) -> Result<Session> {
        let code = JoinCode::parse(code_input)?;
        self.storage
            .get_session_by_code(&code)?
            .ok_or_else(|| Error::CodeNotFound(code.to_string()))
    }

    /// Every session on record, completed ones included.
    pub fn sessions(&self) -> Result<Vec<Session>> {
        self.storage.list_sessions()
    }

    /// Participant by ID, or a not-found error.
    pub fn require_participant(&self, session_id: &str, id: &str) -> Result<Participant> {
        self.storage
            .get_participant(session_id, id)?
            .ok_or_else(|| Error::NotFound(format!("participant {id}")))
    }

    /// Roster in join order.
    pub fn roster(&self, session_id: &str) -> Result<Vec<Participant>> {
        self.storage.list_participants(session_id)
    }

    /// Teams in number order.
    pub fn teams(&self, session_id: &str) -> Result<Vec<Team>> {
        self.storage.list_teams(session_id)
    }

    /// One team's transcript in send order.
    pub fn team_messages(&self, session_id: &str, team_id: &str) -> Result<Vec<ChatMessage>> {
        self.storage.list_team_messages(session_id, team_id)
    }

    /// Every channel's messages in one session, team-grouped.
    pub fn session_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.storage.list_session_messages(session_id)
    }

    /// A team's answers in question order.
    pub fn team_answers(&self, session_id: &str, team_id: &str) -> Result<Vec<Answer>> {
        self.storage.list_team_answers(session_id, team_id)
    }

    /// All answers in a session.
    pub fn session_answers(&self, session_id: &str) -> Result<Vec<Answer>> {
        self.storage.list_session_answers(session_id)
    }

    /// Assemble the facilitator's debrief: per team, the members, the
    /// answers, and how much was said.
    pub fn debrief(&self, session_id: &str) -> Result<Debrief> {
        let session = self.require_session(session_id)?;
        let roster = self.storage.list_participants(session_id)?;

        let mut teams = Vec::new();
        for team in self.storage.list_teams(session_id)? {
            let members: Vec<Participant> = roster
                .iter()
                .filter(|p| p.team_id.as_deref() == Some(team.id.as_str()))
                .cloned()
                .collect();
            let answers = self.storage.list_team_answers(session_id, &team.id)?;
            let message_count = self.storage.list_team_messages(session_id, &team.id)?.len();
            teams.push(TeamDebrief {
                team,
                members,
                answers,
                message_count,
            });
        }
        Ok(Debrief { session, teams })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::{LifecycleError, Role, SessionStatus};
    use tempfile::tempdir;

    fn service() -> (tempfile::TempDir, SessionService) {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        (dir, SessionService::new(storage, EventHub::new(256)))
    }

    fn join_many(svc: &SessionService, code: &str, count: usize) -> Vec<Participant> {
        (0..count)
            .map(|i| svc.join(code, &format!("Delegate {i}")).unwrap())
            .collect()
    }

    #[test]
    fn create_session_binds_a_fresh_code() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();

        assert_eq!(session.status, SessionStatus::Waiting);
        assert_eq!(session.timer_duration, 900);
        assert_eq!(session.game_pin.as_str().len(), 6);

        let found = svc.session_by_code(session.game_pin.as_str()).unwrap();
        assert_eq!(found.id, session.id);

        let custom = svc.create_session(Some(300)).unwrap();
        assert_eq!(custom.timer_duration, 300);
        assert_ne!(custom.game_pin, session.game_pin);
    }

    #[test]
    fn joining_requires_a_live_code_and_a_name() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();

        assert!(matches!(svc.join("ZZZZZZ", "Ada"), Err(Error::CodeNotFound(_))));
        assert!(matches!(svc.join("short", "Ada"), Err(Error::JoinCode(_))));
        assert!(matches!(
            svc.join(session.game_pin.as_str(), "   "),
            Err(Error::EmptyName)
        ));

        let joined = svc.join(session.game_pin.as_str(), "  Ada  ").unwrap();
        assert_eq!(joined.name, "Ada");
        assert!(!joined.is_seated());
    }

    #[test]
    fn join_codes_fold_case() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        let lower = session.game_pin.as_str().to_ascii_lowercase();
        let joined = svc.join(&lower, "Ada").unwrap();
        assert_eq!(joined.session_id, session.id);
    }

    #[test]
    fn workshop_of_nine_seats_five_then_four() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 9);

        let seating = svc.assign_roles(&session.id).unwrap();
        assert_eq!(seating.teams.len(), 2);
        assert_eq!(seating.participants.len(), 9);

        let team_size = |team_id: &str| {
            seating
                .participants
                .iter()
                .filter(|p| p.team_id.as_deref() == Some(team_id))
                .count()
        };
        assert_eq!(team_size(&seating.teams[0].id), 5);
        assert_eq!(team_size(&seating.teams[1].id), 4);

        // Seats follow roster order: CEO, VP Ops, VP Finance, VP
        // Marketing (twice on the five-seat team), then the next team.
        let roster = svc.roster(&session.id).unwrap();
        let expected_roles = [
            Role::Ceo,
            Role::VpOperations,
            Role::VpFinance,
            Role::VpMarketing,
            Role::VpMarketing,
            Role::Ceo,
            Role::VpOperations,
            Role::VpFinance,
            Role::VpMarketing,
        ];
        for (participant, expected) in roster.iter().zip(expected_roles) {
            assert_eq!(participant.role, Some(expected), "{}", participant.name);
            let native = matches!(expected, Role::Ceo | Role::VpOperations);
            assert_eq!(participant.is_native_speaker, Some(native));
        }
    }

    #[test]
    fn six_delegates_cannot_form_teams() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 6);

        let err = svc.assign_roles(&session.id).unwrap_err();
        match err {
            Error::Formation(e) => assert_eq!(e.participant_count, 6),
            other => panic!("expected a formation error, got {other}"),
        }
        // Nothing was seated by the failed attempt.
        assert!(svc.teams(&session.id).unwrap().is_empty());
        assert!(svc.roster(&session.id).unwrap().iter().all(|p| !p.is_seated()));
    }

    #[test]
    fn roles_assign_only_once() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 8);

        svc.assign_roles(&session.id).unwrap();
        assert!(matches!(
            svc.assign_roles(&session.id),
            Err(Error::RolesAlreadyAssigned)
        ));
    }

    #[test]
    fn the_lobby_closes_at_start() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        svc.join(session.game_pin.as_str(), "Ada").unwrap();
        svc.start_session(&session.id).unwrap();

        let err = svc.join(session.game_pin.as_str(), "Late Larry").unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::NotJoinable {
                status: SessionStatus::InProgress
            })
        ));
        // Late joins and role assignment refuse for the same reason.
        assert!(matches!(
            svc.assign_roles(&session.id),
            Err(Error::Lifecycle(LifecycleError::NotAssignable { .. }))
        ));
    }

    #[test]
    fn start_and_end_fire_once_each() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();

        assert!(matches!(
            svc.end_session(&session.id),
            Err(Error::Lifecycle(LifecycleError::NotEndable { .. }))
        ));

        let live = svc.start_session(&session.id).unwrap();
        assert_eq!(live.status, SessionStatus::InProgress);
        assert!(live.started_at.is_some());
        assert!(matches!(
            svc.start_session(&session.id),
            Err(Error::Lifecycle(LifecycleError::NotStartable { .. }))
        ));

        let done = svc.end_session(&session.id).unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert!(done.ended_at.is_some());
        assert!(matches!(
            svc.end_session(&session.id),
            Err(Error::Lifecycle(LifecycleError::NotEndable { .. }))
        ));
    }

    #[test]
    fn completion_releases_the_join_code() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        svc.start_session(&session.id).unwrap();
        svc.end_session(&session.id).unwrap();

        assert!(matches!(
            svc.session_by_code(session.game_pin.as_str()),
            Err(Error::CodeNotFound(_))
        ));
        assert!(matches!(
            svc.join(session.game_pin.as_str(), "Ada"),
            Err(Error::CodeNotFound(_))
        ));
        // The record itself is still there for the debrief.
        let kept = svc.require_session(&session.id).unwrap();
        assert_eq!(kept.status, SessionStatus::Completed);
    }

    #[test]
    fn messages_require_a_seat() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        let ada = svc.join(session.game_pin.as_str(), "Ada").unwrap();

        assert!(matches!(
            svc.post_message(&session.id, &ada.id, "hello", false),
            Err(Error::NoTeam)
        ));
        assert!(matches!(
            svc.post_message(&session.id, &ada.id, "   ", false),
            Err(Error::EmptyMessage)
        ));
        assert!(matches!(
            svc.post_message(&session.id, "nobody", "hello", false),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn transcripts_stay_verbatim_and_per_team() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 9);
        svc.assign_roles(&session.id).unwrap();
        svc.start_session(&session.id).unwrap();

        let roster = svc.roster(&session.id).unwrap();
        let team_one_ceo = &roster[0];
        let team_two_ceo = &roster[5];
        assert!(team_one_ceo.is_ceo() && team_two_ceo.is_ceo());

        svc.post_message(&session.id, &team_one_ceo.id, "  padded verbatim  ", false)
            .unwrap();
        svc.post_message(&session.id, &team_one_ceo.id, "second", true).unwrap();
        svc.post_message(&session.id, &team_two_ceo.id, "other channel", false)
            .unwrap();

        let t1 = team_one_ceo.team_id.as_deref().unwrap();
        let t2 = team_two_ceo.team_id.as_deref().unwrap();
        let channel_one = svc.team_messages(&session.id, t1).unwrap();
        assert_eq!(channel_one.len(), 2);
        assert_eq!(channel_one[0].content, "  padded verbatim  ");
        assert!(!channel_one[0].is_code_switched);
        assert!(channel_one[1].is_code_switched);
        assert!(channel_one[0].timestamp <= channel_one[1].timestamp);

        let channel_two = svc.team_messages(&session.id, t2).unwrap();
        assert_eq!(channel_two.len(), 1);
        assert_eq!(channel_two[0].content, "other channel");
    }

    #[test]
    fn completed_sessions_accept_no_writes() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 4);
        svc.assign_roles(&session.id).unwrap();
        svc.start_session(&session.id).unwrap();

        let roster = svc.roster(&session.id).unwrap();
        let ceo = &roster[0];
        svc.post_message(&session.id, &ceo.id, "while live", false).unwrap();
        svc.end_session(&session.id).unwrap();

        assert!(matches!(
            svc.post_message(&session.id, &ceo.id, "too late", false),
            Err(Error::Lifecycle(LifecycleError::Completed))
        ));
        let entry = AnswerEntry {
            question_number: 1,
            answer_text: "too late".into(),
        };
        assert!(matches!(
            svc.submit_answers(&session.id, &ceo.id, std::slice::from_ref(&entry)),
            Err(Error::Lifecycle(LifecycleError::Completed))
        ));
    }

    #[test]
    fn only_the_ceo_submits_answers() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 4);
        svc.assign_roles(&session.id).unwrap();

        let roster = svc.roster(&session.id).unwrap();
        let ceo = &roster[0];
        let finance = &roster[2];
        assert_eq!(finance.role, Some(Role::VpFinance));

        let entry = AnswerEntry {
            question_number: 1,
            answer_text: "A large one.".into(),
        };
        let err = svc
            .submit_answers(&session.id, &finance.id, std::slice::from_ref(&entry))
            .unwrap_err();
        assert!(matches!(err, Error::NotCeo { role: "VP Finance" }));

        let saved = svc
            .submit_answers(&session.id, &ceo.id, std::slice::from_ref(&entry))
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].submitted_by, ceo.id);
    }

    #[test]
    fn answers_upsert_per_question() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 4);
        svc.assign_roles(&session.id).unwrap();

        let roster = svc.roster(&session.id).unwrap();
        let ceo = &roster[0];
        let team_id = ceo.team_id.clone().unwrap();

        let batch = vec![
            AnswerEntry { question_number: 1, answer_text: "draft".into() },
            AnswerEntry { question_number: 2, answer_text: "steady".into() },
        ];
        svc.submit_answers(&session.id, &ceo.id, &batch).unwrap();

        let revised = vec![AnswerEntry { question_number: 1, answer_text: "final".into() }];
        svc.submit_answers(&session.id, &ceo.id, &revised).unwrap();

        let answers = svc.team_answers(&session.id, &team_id).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_number, 1);
        assert_eq!(answers[0].answer_text, "final");
        assert_eq!(answers[1].answer_text, "steady");
    }

    #[test]
    fn question_numbers_are_validated_up_front() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 4);
        svc.assign_roles(&session.id).unwrap();
        let roster = svc.roster(&session.id).unwrap();
        let ceo = &roster[0];
        let team_id = ceo.team_id.clone().unwrap();

        let batch = vec![
            AnswerEntry { question_number: 1, answer_text: "fine".into() },
            AnswerEntry { question_number: 5, answer_text: "out of range".into() },
        ];
        assert!(matches!(
            svc.submit_answers(&session.id, &ceo.id, &batch),
            Err(Error::QuestionOutOfRange(5))
        ));
        // The batch failed whole: not even the valid entry landed.
        assert!(svc.team_answers(&session.id, &team_id).unwrap().is_empty());
    }

    #[test]
    fn commits_announce_in_order() {
        let (_dir, svc) = service();
        let mut rx = svc.hub().subscribe();

        let session = svc.create_session(None).unwrap();
        let ada = svc.join(session.game_pin.as_str(), "Ada").unwrap();
        join_many(&svc, session.game_pin.as_str(), 3);
        svc.assign_roles(&session.id).unwrap();
        svc.start_session(&session.id).unwrap();
        svc.post_message(&session.id, &ada.id, "hello", false).unwrap();
        svc.end_session(&session.id).unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                RecordEvent::SessionUpdated { .. } => "session",
                RecordEvent::ParticipantInserted { .. } => "insert",
                RecordEvent::ParticipantUpdated { .. } => "update",
                RecordEvent::MessageInserted { .. } => "message",
            });
        }
        assert_eq!(
            kinds,
            vec![
                "session", // created
                "insert", "insert", "insert", "insert",
                "update", "update", "update", "update", // seating
                "session", // started
                "message",
                "session", // completed
            ]
        );
    }

    #[test]
    fn debrief_collects_everything_per_team() {
        let (_dir, svc) = service();
        let session = svc.create_session(None).unwrap();
        join_many(&svc, session.game_pin.as_str(), 9);
        svc.assign_roles(&session.id).unwrap();
        svc.start_session(&session.id).unwrap();

        let roster = svc.roster(&session.id).unwrap();
        let ceo = &roster[0];
        svc.post_message(&session.id, &ceo.id, "first", false).unwrap();
        svc.post_message(&session.id, &ceo.id, "second", true).unwrap();
        let entry = AnswerEntry { question_number: 3, answer_text: "break even".into() };
        svc.submit_answers(&session.id, &ceo.id, std::slice::from_ref(&entry))
            .unwrap();
        svc.end_session(&session.id).unwrap();

        let debrief = svc.debrief(&session.id).unwrap();
        assert_eq!(debrief.session.status, SessionStatus::Completed);
        assert_eq!(debrief.teams.len(), 2);
        assert_eq!(debrief.teams[0].team.team_number, 1);
        assert_eq!(debrief.teams[0].members.len(), 5);
        assert_eq!(debrief.teams[0].message_count, 2);
        assert_eq!(debrief.teams[0].answers.len(), 1);
        assert_eq!(debrief.teams[1].members.len(), 4);
        assert_eq!(debrief.teams[1].message_count, 0);
    }
}
