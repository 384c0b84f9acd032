//! Record models for the Palaver node.
//!
//! Everything the node persists is one of five records:
//!
//! - [`Session`] - one run of the exercise, addressed by a join code
//! - [`Team`] - a negotiation team within a session
//! - [`Participant`] - a person in the roster, seated once roles exist
//! - [`ChatMessage`] - one line of team chat, stored verbatim
//! - [`Answer`] - a team's response to one briefing question
//!
//! Records are JSON values in storage and on the wire; timestamps are
//! unix epoch milliseconds throughout.

mod answer;
mod message;
mod participant;
mod session;
mod team;

pub use answer::{valid_question_number, Answer, BRIEFING_QUESTIONS, QUESTION_COUNT};
pub use message::ChatMessage;
pub use participant::Participant;
pub use session::Session;
pub use team::Team;

/// Milliseconds since the unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Generate a record ID: blake3 of the record kind, a seed, the wall
/// clock, and a nonce. Collisions would need the same nonce in the same
/// millisecond for the same seed.
pub fn record_id(kind: &str, seed: &str, now_ms: u64, nonce: u64) -> String {
    let material = format!("{kind}:{seed}:{now_ms}:{nonce}");
    hex::encode(blake3::hash(material.as_bytes()).as_bytes())
}
