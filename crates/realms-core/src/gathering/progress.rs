//! Elapsed-time yield accrual for gathering sessions.
//!
//! Like the rest of the engine this is wall-clock based and has no internal
//! thread: the caller decides how often to poll and passes `now` in.
//!
//! Only whole units are credited. When units are credited without reaching
//! the goal, `last_gathered_at` moves forward by exactly the time those units
//! cost, so the partial unit in progress carries over to the next poll.
//! Polling every second therefore yields the same total as polling once.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::session::{validate_goal, GatheringSession};
use crate::error::GatheringError;

/// Result of evaluating a session at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatheringProgress {
    pub quantity_gathered: u32,
    pub quantity_goal: u32,
    /// 0.0 .. 100.0
    pub progress_percent: f64,
    pub time_remaining_ms: u64,
    pub is_complete: bool,
    /// Units credited by this evaluation. Non-zero means the session changed
    /// and must be persisted.
    pub units_credited: u32,
}

impl GatheringProgress {
    pub fn changed(&self) -> bool {
        self.units_credited > 0
    }
}

/// Credit every whole unit produced between `last_gathered_at` and `now`.
///
/// Mutates `session` only when at least one unit is credited. A `now` earlier
/// than `last_gathered_at` counts as zero elapsed time.
///
/// # Errors
/// Returns `InvalidInput` for a zero `gathering_time_ms` or `quantity_goal`,
/// before touching the session.
pub fn advance(
    session: &mut GatheringSession,
    gathering_time_ms: u64,
    now: DateTime<Utc>,
) -> Result<GatheringProgress, GatheringError> {
    validate_rate(gathering_time_ms)?;
    validate_goal(session.quantity_goal)?;

    let gathered = session.quantity_gathered.min(session.quantity_goal);
    let elapsed_ms = elapsed_ms(session.last_gathered_at, now);
    let producible = elapsed_ms / gathering_time_ms;
    let remaining = u64::from(session.quantity_goal - gathered);
    // Bounded by the goal, so it fits back into u32.
    let credited = producible.min(remaining) as u32;

    if credited > 0 {
        session.quantity_gathered = gathered + credited;
        session.last_gathered_at = if session.quantity_gathered >= session.quantity_goal {
            now
        } else {
            // credited * rate <= elapsed_ms, which came from an i64 span.
            let spent = u64::from(credited) * gathering_time_ms;
            session.last_gathered_at + Duration::milliseconds(spent as i64)
        };
    }

    Ok(summarize(session, gathering_time_ms, credited))
}

/// Evaluate progress without mutating the caller's session.
///
/// # Errors
/// Same as [`advance`].
pub fn calculate(
    session: &GatheringSession,
    gathering_time_ms: u64,
    now: DateTime<Utc>,
) -> Result<GatheringProgress, GatheringError> {
    let mut scratch = session.clone();
    advance(&mut scratch, gathering_time_ms, now)
}

fn summarize(session: &GatheringSession, gathering_time_ms: u64, credited: u32) -> GatheringProgress {
    let goal = session.quantity_goal;
    let gathered = session.quantity_gathered.min(goal);
    let remaining = u64::from(goal - gathered);
    GatheringProgress {
        quantity_gathered: gathered,
        quantity_goal: goal,
        progress_percent: f64::from(gathered) * 100.0 / f64::from(goal),
        time_remaining_ms: remaining.saturating_mul(gathering_time_ms),
        is_complete: gathered >= goal,
        units_credited: credited,
    }
}

fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    now.signed_duration_since(since).num_milliseconds().max(0) as u64
}

fn validate_rate(gathering_time_ms: u64) -> Result<(), GatheringError> {
    if gathering_time_ms == 0 {
        return Err(GatheringError::invalid(
            "gathering_time_ms",
            "must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gathering::SkillType;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn session(goal: u32) -> GatheringSession {
        GatheringSession::new("hero", SkillType::Woodcutting, "oak_log", goal, t0()).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn partial_progress_scenario() {
        let mut s = session(10);
        let p = advance(&mut s, 3000, at(9500)).unwrap();
        assert_eq!(p.quantity_gathered, 3);
        assert_eq!(p.progress_percent, 30.0);
        assert_eq!(p.time_remaining_ms, 21_000);
        assert!(!p.is_complete);
        assert_eq!(p.units_credited, 3);

        let p = advance(&mut s, 3000, at(30_000)).unwrap();
        assert_eq!(p.quantity_gathered, 10);
        assert_eq!(p.progress_percent, 100.0);
        assert_eq!(p.time_remaining_ms, 0);
        assert!(p.is_complete);
    }

    #[test]
    fn remainder_carries_over_between_polls() {
        let mut s = session(10);
        advance(&mut s, 3000, at(3500)).unwrap();
        assert_eq!(s.last_gathered_at, at(3000));
        let p = advance(&mut s, 3000, at(6000)).unwrap();
        assert_eq!(p.quantity_gathered, 2);
    }

    #[test]
    fn no_new_units_leaves_session_untouched() {
        let mut s = session(10);
        let before = s.clone();
        let p = advance(&mut s, 3000, at(2999)).unwrap();
        assert_eq!(p.units_credited, 0);
        assert!(!p.changed());
        assert_eq!(s, before);
    }

    #[test]
    fn clock_skew_counts_as_zero_elapsed() {
        let mut s = session(10);
        let p = advance(&mut s, 1000, at(-60_000)).unwrap();
        assert_eq!(p.quantity_gathered, 0);
        assert_eq!(s.last_gathered_at, t0());
    }

    #[test]
    fn goal_clamps_large_elapsed_time() {
        let mut s = session(4);
        let p = advance(&mut s, 1000, at(86_400_000)).unwrap();
        assert_eq!(p.quantity_gathered, 4);
        assert!(p.is_complete);
        assert_eq!(s.last_gathered_at, at(86_400_000));
    }

    #[test]
    fn zero_rate_is_rejected_without_mutation() {
        let mut s = session(4);
        let before = s.clone();
        let err = advance(&mut s, 0, at(10_000)).unwrap_err();
        assert!(matches!(err, GatheringError::InvalidInput { .. }));
        assert_eq!(s, before);
    }

    #[test]
    fn zero_goal_is_rejected() {
        let mut s = session(4);
        s.quantity_goal = 0;
        assert!(advance(&mut s, 1000, at(10_000)).is_err());
    }

    #[test]
    fn calculate_does_not_mutate() {
        let s = session(10);
        let p = calculate(&s, 1000, at(5000)).unwrap();
        assert_eq!(p.quantity_gathered, 5);
        assert_eq!(s.quantity_gathered, 0);
    }
}
