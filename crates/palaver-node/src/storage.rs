//! Persistent storage using RocksDB.
//!
//! Records are JSON values under composite string keys. Message keys
//! embed a zero-padded timestamp, so a prefix scan over a team channel
//! yields the transcript already in send order. The join-code index maps
//! a code to the session currently holding it; completed sessions give
//! their code back.

use crate::error::Result;
use crate::models::{Answer, ChatMessage, Participant, Session, Team};
use palaver_core::JoinCode;
use rocksdb::{Options, DB};
use std::path::Path;

/// Storage backend for session data.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    // --- Sessions ---

    /// Store a session.
    pub fn put_session(&self, session: &Session) -> Result<()> {
        let key = format!("session:{}", session.id);
        let value = serde_json::to_vec(session)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// Get a session by ID.
    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let key = format!("session:{}", id);
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// List all sessions, newest first.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let prefix = b"session:";
        let mut sessions = Vec::new();

        let iter = self.db.prefix_iterator(prefix);
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix) {
                let session: Session = serde_json::from_slice(&value)?;
                sessions.push(session);
            } else {
                break;
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    // --- Join-code index ---

    /// Point a join code at a session. Overwrites any previous binding;
    /// the service checks liveness before rebinding.
    pub fn bind_code(&self, code: &JoinCode, session_id: &str) -> Result<()> {
        let key = format!("pin:{}", code);
        self.db.put(key.as_bytes(), session_id.as_bytes())?;
        Ok(())
    }

    /// Free a join code for reuse.
    pub fn release_code(&self, code: &JoinCode) -> Result<()> {
        let key = format!("pin:{}", code);
        self.db.delete(key.as_bytes())?;
        Ok(())
    }

    /// Session currently bound to a join code, if any.
    pub fn session_id_for_code(&self, code: &JoinCode) -> Result<Option<String>> {
        let key = format!("pin:{}", code);
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
            None => Ok(None),
        }
    }

    /// Resolve a join code to its session record.
    pub fn get_session_by_code(&self, code: &JoinCode) -> Result<Option<Session>> {
        match self.session_id_for_code(code)? {
            Some(id) => self.get_session(&id),
            None => Ok(None),
        }
    }

    // --- Teams ---

    /// Store a team.
    pub fn put_team(&self, team: &Team) -> Result<()> {
        let key = format!("team:{}:{}", team.session_id, team.id);
        let value = serde_json::to_vec(team)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// Get a team by ID within a session.
    pub fn get_team(&self, session_id: &str, team_id: &str) -> Result<Option<Team>> {
        let key = format!("team:{}:{}", session_id, team_id);
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// List a session's teams in team-number order.
    pub fn list_teams(&self, session_id: &str) -> Result<Vec<Team>> {
        let prefix = format!("team:{}:", session_id);
        let mut teams = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix.as_bytes()) {
                let team: Team = serde_json::from_slice(&value)?;
                teams.push(team);
            } else {
                break;
            }
        }

        teams.sort_by_key(|t| t.team_number);
        Ok(teams)
    }

    // --- Participants ---

    /// Store a participant.
    pub fn put_participant(&self, participant: &Participant) -> Result<()> {
        let key = format!("participant:{}:{}", participant.session_id, participant.id);
        let value = serde_json::to_vec(participant)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// Get a participant by ID within a session.
    pub fn get_participant(&self, session_id: &str, id: &str) -> Result<Option<Participant>> {
        let key = format!("participant:{}:{}", session_id, id);
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// List a session's roster in join order, with the ID as tiebreak so
    /// the order is total even for same-millisecond joins.
    pub fn list_participants(&self, session_id: &str) -> Result<Vec<Participant>> {
        let prefix = format!("participant:{}:", session_id);
        let mut participants = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix.as_bytes()) {
                let participant: Participant = serde_json::from_slice(&value)?;
                participants.push(participant);
            } else {
                break;
            }
        }

        participants.sort_by(|a, b| (a.joined_at, &a.id).cmp(&(b.joined_at, &b.id)));
        Ok(participants)
    }

    // --- Messages ---

    /// Store a chat message. The key embeds the timestamp zero-padded to
    /// 20 digits, so key order is transcript order.
    pub fn put_message(&self, message: &ChatMessage) -> Result<()> {
        let key = format!(
            "message:{}:{}:{:020}:{}",
            message.session_id, message.team_id, message.timestamp, message.id
        );
        let value = serde_json::to_vec(message)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// A team's transcript in send order.
    pub fn list_team_messages(&self, session_id: &str, team_id: &str) -> Result<Vec<ChatMessage>> {
        let prefix = format!("message:{}:{}:", session_id, team_id);
        self.scan_messages(&prefix)
    }

    /// Every message in a session, grouped by team then send order.
    pub fn list_session_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let prefix = format!("message:{}:", session_id);
        self.scan_messages(&prefix)
    }

    fn scan_messages(&self, prefix: &str) -> Result<Vec<ChatMessage>> {
        let mut messages = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix.as_bytes()) {
                let message: ChatMessage = serde_json::from_slice(&value)?;
                messages.push(message);
            } else {
                break;
            }
        }

        Ok(messages)
    }

    // --- Answers ---

    /// Store an answer. The key is (session, team, question), so a team
    /// resubmitting a question overwrites its previous answer.
    pub fn put_answer(&self, answer: &Answer) -> Result<()> {
        let key = format!(
            "answer:{}:{}:{}",
            answer.session_id, answer.team_id, answer.question_number
        );
        let value = serde_json::to_vec(answer)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// A team's answers in question order.
    pub fn list_team_answers(&self, session_id: &str, team_id: &str) -> Result<Vec<Answer>> {
        let prefix = format!("answer:{}:{}:", session_id, team_id);
        let mut answers = self.scan_answers(&prefix)?;
        answers.sort_by_key(|a| a.question_number);
        Ok(answers)
    }

    /// Every answer in a session.
    pub fn list_session_answers(&self, session_id: &str) -> Result<Vec<Answer>> {
        let prefix = format!("answer:{}:", session_id);
        let mut answers = self.scan_answers(&prefix)?;
        answers.sort_by(|a, b| (&a.team_id, a.question_number).cmp(&(&b.team_id, b.question_number)));
        Ok(answers)
    }

    fn scan_answers(&self, prefix: &str) -> Result<Vec<Answer>> {
        let mut answers = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix.as_bytes()) {
                let answer: Answer = serde_json::from_slice(&value)?;
                answers.push(answer);
            } else {
                break;
            }
        }

        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::SessionStatus;
    use tempfile::tempdir;

    fn code(s: &str) -> JoinCode {
        JoinCode::parse(s).unwrap()
    }

    fn open() -> (tempfile::TempDir, Storage) {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    #[test]
    fn session_roundtrip() {
        let (_dir, storage) = open();

        let session = Session::new("s1".into(), code("AB12CD"), 900, 1_000);
        storage.put_session(&session).unwrap();

        let loaded = storage.get_session("s1").unwrap().unwrap();
        assert_eq!(session, loaded);
        assert_eq!(loaded.status, SessionStatus::Waiting);
        assert!(storage.get_session("missing").unwrap().is_none());
    }

    #[test]
    fn join_code_binding_lifecycle() {
        let (_dir, storage) = open();
        let pin = code("XY99ZZ");

        assert!(storage.session_id_for_code(&pin).unwrap().is_none());

        storage.bind_code(&pin, "s1").unwrap();
        assert_eq!(storage.session_id_for_code(&pin).unwrap().as_deref(), Some("s1"));

        let session = Session::new("s1".into(), pin.clone(), 900, 1_000);
        storage.put_session(&session).unwrap();
        assert_eq!(storage.get_session_by_code(&pin).unwrap(), Some(session));

        storage.release_code(&pin).unwrap();
        assert!(storage.session_id_for_code(&pin).unwrap().is_none());
        assert!(storage.get_session_by_code(&pin).unwrap().is_none());
    }

    #[test]
    fn rosters_come_back_in_join_order() {
        let (_dir, storage) = open();

        // Insert out of order, including a same-millisecond pair.
        let late = Participant::new("zz".into(), "s1".into(), "Zoe".into(), 30);
        let early = Participant::new("aa".into(), "s1".into(), "Ada".into(), 10);
        let tie_b = Participant::new("b2".into(), "s1".into(), "Bo".into(), 20);
        let tie_a = Participant::new("b1".into(), "s1".into(), "Bea".into(), 20);

        for p in [&late, &early, &tie_b, &tie_a] {
            storage.put_participant(p).unwrap();
        }
        // A different session must not leak into the scan.
        storage
            .put_participant(&Participant::new("x".into(), "s2".into(), "Nix".into(), 1))
            .unwrap();

        let roster = storage.list_participants("s1").unwrap();
        let ids: Vec<&str> = roster.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["aa", "b1", "b2", "zz"]);
    }

    #[test]
    fn transcripts_come_back_in_send_order() {
        let (_dir, storage) = open();

        let msg = |id: &str, ts: u64| {
            ChatMessage::new(
                id.into(),
                "s1".into(),
                "t1".into(),
                "p1".into(),
                format!("message {id}"),
                false,
                ts,
            )
        };

        storage.put_message(&msg("m2", 2_000)).unwrap();
        storage.put_message(&msg("m3", 30_000)).unwrap();
        storage.put_message(&msg("m1", 1_000)).unwrap();
        // Without zero-padding, 2000 would sort after 30000 as a string.
        let transcript = storage.list_team_messages("s1", "t1").unwrap();
        let ids: Vec<&str> = transcript.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn team_channels_are_isolated() {
        let (_dir, storage) = open();

        let make = |id: &str, team: &str| {
            ChatMessage::new(
                id.into(),
                "s1".into(),
                team.into(),
                "p1".into(),
                "hi".into(),
                false,
                5,
            )
        };
        storage.put_message(&make("a", "t1")).unwrap();
        storage.put_message(&make("b", "t2")).unwrap();

        assert_eq!(storage.list_team_messages("s1", "t1").unwrap().len(), 1);
        assert_eq!(storage.list_team_messages("s1", "t2").unwrap().len(), 1);
        assert_eq!(storage.list_session_messages("s1").unwrap().len(), 2);
    }

    #[test]
    fn answers_upsert_per_question() {
        let (_dir, storage) = open();

        let answer = |id: &str, q: u8, text: &str| Answer {
            id: id.into(),
            session_id: "s1".into(),
            team_id: "t1".into(),
            question_number: q,
            answer_text: text.into(),
            submitted_by: "p1".into(),
            submitted_at: 7,
        };

        storage.put_answer(&answer("a1", 1, "first try")).unwrap();
        storage.put_answer(&answer("a2", 2, "other question")).unwrap();
        storage.put_answer(&answer("a3", 1, "second try")).unwrap();

        let answers = storage.list_team_answers("s1", "t1").unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_number, 1);
        assert_eq!(answers[0].answer_text, "second try");
        assert_eq!(answers[1].question_number, 2);
    }

    #[test]
    fn teams_list_in_number_order() {
        let (_dir, storage) = open();

        storage.put_team(&Team::new("tb".into(), "s1".into(), 2, 5)).unwrap();
        storage.put_team(&Team::new("ta".into(), "s1".into(), 1, 5)).unwrap();
        storage.put_team(&Team::new("tc".into(), "s1".into(), 3, 5)).unwrap();

        let teams = storage.list_teams("s1").unwrap();
        let numbers: Vec<u32> = teams.iter().map(|t| t.team_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(storage.get_team("s1", "tb").unwrap().unwrap().team_number, 2);
    }
}
