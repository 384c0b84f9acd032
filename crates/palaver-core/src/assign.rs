//! Role and fluency assignment within formed teams.
//!
//! Seats are filled in join order: the planner fixes the team sizes, and
//! participants are dealt into teams front to back. Within a team the seat
//! index alone decides the role and the fluency flag, so two runs over the
//! same ordered roster always produce the same assignment.

use thiserror::Error;

use crate::role::Role;
use crate::teams::{MAX_TEAM_SIZE, MIN_TEAM_SIZE};

/// Role and fluency per seat index within a team.
///
/// Seats 0-1 are the native-speaker block (CEO and VP Operations); seats
/// 2-4 are non-native. The fifth seat repeats VP Marketing, so a team of
/// five carries two marketing VPs rather than a fifth distinct role.
pub const SLOT_ROLES: [(Role, bool); MAX_TEAM_SIZE] = [
    (Role::Ceo, true),
    (Role::VpOperations, true),
    (Role::VpFinance, false),
    (Role::VpMarketing, false),
    (Role::VpMarketing, false),
];

// Compile-time check: exactly two native seats, and they come first.
const _: () = assert!(
    SLOT_ROLES[0].1 && SLOT_ROLES[1].1 && !SLOT_ROLES[2].1 && !SLOT_ROLES[3].1 && !SLOT_ROLES[4].1
);

/// Role and fluency for a seat index, or `None` past the largest team.
pub const fn role_for_slot(slot: usize) -> Option<(Role, bool)> {
    if slot < SLOT_ROLES.len() {
        Some(SLOT_ROLES[slot])
    } else {
        None
    }
}

/// One participant's computed seat.
///
/// Returned in roster order: the assignment at position `i` belongs to the
/// `i`-th participant of the ordered roster the plan was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// 1-based team number, in plan order.
    pub team_number: u32,
    /// Seat index within the team, 0-based.
    pub slot: usize,
    /// Executive role for this seat.
    pub role: Role,
    /// Whether this seat speaks the negotiation language natively.
    pub is_native_speaker: bool,
}

/// A team size outside the 4-5 range slipped into an assignment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid size {size} for team {team_number}: teams hold 4-5 members")]
pub struct AssignError {
    /// 1-based team number with the bad size.
    pub team_number: u32,
    /// The offending size.
    pub size: usize,
}

/// Expand a team-size plan into per-seat assignments.
///
/// Output length equals the sum of `team_sizes`. Plans produced by
/// [`crate::teams::plan`] never fail here; the size check guards against
/// hand-built plans.
pub fn assign(team_sizes: &[usize]) -> Result<Vec<Assignment>, AssignError> {
    let total = team_sizes.iter().sum();
    let mut seats = Vec::with_capacity(total);
    for (index, &size) in team_sizes.iter().enumerate() {
        let team_number = index as u32 + 1;
        if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&size) {
            return Err(AssignError { team_number, size });
        }
        for slot in 0..size {
            let (role, is_native_speaker) = SLOT_ROLES[slot];
            seats.push(Assignment {
                team_number,
                slot,
                role,
                is_native_speaker,
            });
        }
    }
    Ok(seats)
}
