//! Team formation planning.
//!
//! A roster of `n` participants is split into teams of [`MIN_TEAM_SIZE`] or
//! [`MAX_TEAM_SIZE`] members. Feasibility is exactly the question of whether
//! `n = 4a + 5b` has a non-negative solution, which fails only for
//! n ∈ {0, 1, 2, 3, 6, 7, 11}. Every n ≥ 12 is feasible (12, 13, 14, 15 are,
//! and adding 4 preserves feasibility), but the planner still enumerates
//! decompositions instead of hard-coding that set.
//!
//! # Greedy with lookahead
//!
//! [`plan`] prefers larger teams: it takes a team of 5 whenever the remaining
//! roster stays decomposable afterwards, and falls back to a team of 4
//! otherwise. For 9 participants that yields \[5, 4\]; a naive greedy pass
//! would strand a single leftover participant.

use thiserror::Error;

/// Smallest workable team.
pub const MIN_TEAM_SIZE: usize = 4;

/// Largest workable team.
pub const MAX_TEAM_SIZE: usize = 5;

/// A roster count that cannot be split into teams of 4 or 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot form teams with {participant_count} participants: need groups of 4-5 people")]
pub struct FormationError {
    /// The roster size that was rejected.
    pub participant_count: usize,
}

/// Whether `count` non-negative participants decompose into teams of 4 or 5.
///
/// Zero is not feasible: a session with nobody in it has no teams to form.
pub fn is_feasible(count: usize) -> bool {
    count >= MIN_TEAM_SIZE && decomposable(count)
}

/// Whether `count = 4a + 5b` for some non-negative a, b. Zero decomposes
/// trivially (the empty split), which is what the planner's lookahead needs.
fn decomposable(count: usize) -> bool {
    let mut fives = 0;
    while fives * MAX_TEAM_SIZE <= count {
        if (count - fives * MAX_TEAM_SIZE) % MIN_TEAM_SIZE == 0 {
            return true;
        }
        fives += 1;
    }
    false
}

/// Split a roster into team sizes, largest teams first.
///
/// The returned sizes always sum to `participant_count` and each lies in
/// `[MIN_TEAM_SIZE, MAX_TEAM_SIZE]`. Infeasible counts are rejected with
/// the count embedded in the error.
pub fn plan(participant_count: usize) -> Result<Vec<usize>, FormationError> {
    if !is_feasible(participant_count) {
        return Err(FormationError { participant_count });
    }

    let mut sizes = Vec::with_capacity(participant_count / MIN_TEAM_SIZE);
    let mut remaining = participant_count;
    while remaining > 0 {
        // Take a 5 only when the leftover still decomposes.
        if remaining >= MAX_TEAM_SIZE && decomposable(remaining - MAX_TEAM_SIZE) {
            sizes.push(MAX_TEAM_SIZE);
            remaining -= MAX_TEAM_SIZE;
        } else {
            sizes.push(MIN_TEAM_SIZE);
            remaining -= MIN_TEAM_SIZE;
        }
    }
    Ok(sizes)
}
