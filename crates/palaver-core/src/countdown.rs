//! Countdown arithmetic for the negotiation timer.
//!
//! The timer is not a task: remaining time is a pure function of the
//! session's start instant, its configured duration, and "now". Every
//! surface (HTTP, socket heartbeats, the admin CLI) computes the same
//! value from the same three numbers, so clients can tick locally between
//! server heartbeats without drifting.

/// Default negotiation length: fifteen minutes.
pub const DEFAULT_TIMER_DURATION_SECS: u64 = 900;

/// Whole seconds left on the clock at `now_ms`.
///
/// Clamped to zero once time is up, and clamped to the full duration if
/// `now_ms` is somehow earlier than the start (clock skew between hosts).
pub fn remaining_secs(now_ms: u64, started_at_ms: u64, duration_secs: u64) -> u64 {
    let elapsed_ms = now_ms.saturating_sub(started_at_ms);
    let duration_ms = duration_secs.saturating_mul(1000);
    duration_ms.saturating_sub(elapsed_ms) / 1000
}

/// Render seconds as `m:ss` for countdown displays.
pub fn format_mmss(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
