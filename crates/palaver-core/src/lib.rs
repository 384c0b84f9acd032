//! Palaver Simulation Rules
//!
//! Pure rules for a facilitated negotiation exercise played across a
//! simulated language barrier. A facilitator opens a session, participants
//! join with a six-character code, and the roster is partitioned into
//! negotiation teams of four or five. Each team is an executive committee
//! (CEO and three VP roles) split into native and non-native speakers of
//! the negotiation language.
//!
//! # Team Arithmetic
//!
//! Teams hold 4 or 5 members, so a roster of `n` participants is workable
//! exactly when `n = 4a + 5b` for some non-negative `a`, `b`. The planner
//! enumerates decompositions rather than trusting a closed form; the full
//! set of unworkable counts is {0, 1, 2, 3, 6, 7, 11}.
//!
//! # Perspective Garbling
//!
//! Messages are stored verbatim and distorted per viewer at display time.
//! A message crossing the fluency barrier loses roughly a quarter of its
//! words; a code-switched message (sent in the non-native speakers' own
//! language) is fully opaque to native speakers and fully clear to
//! non-native ones. Short words, numbers, and punctuation survive.
//!
//! Everything in this crate is deterministic given an RNG, which keeps the
//! rules testable without a clock, a network, or a store.

mod assign;
mod countdown;
mod garble;
mod join_code;
mod lifecycle;
mod role;
mod teams;

pub use assign::{assign, role_for_slot, AssignError, Assignment, SLOT_ROLES};
pub use countdown::{format_mmss, remaining_secs, DEFAULT_TIMER_DURATION_SECS};
pub use garble::{
    garble_message, garble_words, CROSS_FLUENCY_PROBABILITY, EXEMPT_WORD_LEN, GARBLE_SYMBOLS,
};
pub use join_code::{JoinCode, JoinCodeError, JOIN_CODE_ALPHABET, JOIN_CODE_LEN};
pub use lifecycle::{LifecycleError, SessionStatus, UnknownStatus};
pub use role::{role_color, role_display_name, Role, UnknownRole};
pub use teams::{is_feasible, plan, FormationError, MAX_TEAM_SIZE, MIN_TEAM_SIZE};

/// Native-speaker seats in every team, regardless of size.
pub const NATIVE_SPEAKERS_PER_TEAM: usize = 2;

// Compile-time check: the smallest team is exactly the native block plus
// the two mandatory non-native VP seats.
const _: () = assert!(NATIVE_SPEAKERS_PER_TEAM + 2 == MIN_TEAM_SIZE);
