//! Skill experience and leveling.
//!
//! Experience is cumulative and never reset on level-up. Being level `L`
//! and holding at least `L * 100` total experience advances to `L + 1`.
//! Levels stop at [`MAX_LEVEL`]; surplus experience is kept but does nothing.
//! Totals saturate at [`MAX_EXPERIENCE`], the largest value SQLite can store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatheringError;
use crate::gathering::SkillType;

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 99;

/// Per-level step of the cumulative threshold curve.
pub const XP_PER_LEVEL: u64 = 100;

/// Ceiling for cumulative experience (SQLite INTEGER is a signed 64-bit value).
pub const MAX_EXPERIENCE: u64 = i64::MAX as u64;

/// One leveling track for a (character, skill) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub character_id: String,
    pub skill_type: SkillType,
    pub level: u32,
    pub experience: u64,
    pub updated_at: DateTime<Utc>,
}

impl SkillRecord {
    /// A record as it exists before its first experience grant.
    pub fn fresh(character_id: &str, skill_type: SkillType, now: DateTime<Utc>) -> Self {
        Self {
            character_id: character_id.to_string(),
            skill_type,
            level: MIN_LEVEL,
            experience: 0,
            updated_at: now,
        }
    }

    /// Apply an experience grant in place.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the stored level is out of range.
    pub fn grant(&mut self, xp_gained: u64, now: DateTime<Utc>) -> Result<LevelResult, GatheringError> {
        let result = apply_experience(self.level, self.experience, xp_gained)?;
        self.level = result.new_level;
        self.experience = result.new_experience;
        self.updated_at = now;
        Ok(result)
    }

    pub fn progress(&self) -> f64 {
        level_progress(self.level, self.experience)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub previous_level: u32,
    pub new_level: u32,
    pub new_experience: u64,
}

impl LevelResult {
    pub fn levels_gained(&self) -> u32 {
        self.new_level - self.previous_level
    }
}

/// Cumulative experience needed to leave `level`.
pub fn threshold_for(level: u32) -> u64 {
    u64::from(level) * XP_PER_LEVEL
}

/// Convert an experience grant into a new level and cumulative total.
///
/// # Errors
/// Returns `InvalidInput` if `current_level` is outside 1..=99.
pub fn apply_experience(
    current_level: u32,
    current_experience: u64,
    xp_gained: u64,
) -> Result<LevelResult, GatheringError> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&current_level) {
        return Err(GatheringError::invalid(
            "level",
            format!("must be between {MIN_LEVEL} and {MAX_LEVEL}, got {current_level}"),
        ));
    }

    let new_experience = current_experience
        .saturating_add(xp_gained)
        .min(MAX_EXPERIENCE);
    let mut new_level = current_level;
    while new_level < MAX_LEVEL && new_experience >= threshold_for(new_level) {
        new_level += 1;
    }

    Ok(LevelResult {
        previous_level: current_level,
        new_level,
        new_experience,
    })
}

/// Library entry point for callers holding signed amounts, such as
/// admin adjustments or values read from external sources.
///
/// The engine itself only produces unsigned grants and calls
/// [`apply_experience`] directly.
///
/// # Errors
/// Returns `InvalidInput` for a negative grant or an out-of-range level.
pub fn apply_signed_experience(
    current_level: u32,
    current_experience: u64,
    xp_gained: i64,
) -> Result<LevelResult, GatheringError> {
    let xp = u64::try_from(xp_gained)
        .map_err(|_| GatheringError::invalid("xp_gained", "must not be negative"))?;
    apply_experience(current_level, current_experience, xp)
}

/// Progress-bar fill for a level, `experience / (level * 100)` in 0.0..=1.0.
///
/// At the level cap the bar is always full.
pub fn level_progress(level: u32, experience: u64) -> f64 {
    if level >= MAX_LEVEL {
        return 1.0;
    }
    let threshold = threshold_for(level.max(MIN_LEVEL));
    (experience as f64 / threshold as f64).clamp(0.0, 1.0)
}

pub fn experience_to_next_level(level: u32, experience: u64) -> u64 {
    if level >= MAX_LEVEL {
        return 0;
    }
    threshold_for(level.max(MIN_LEVEL)).saturating_sub(experience)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_at_threshold_levels_up() {
        let r = apply_experience(1, 0, 100).unwrap();
        assert_eq!((r.new_level, r.new_experience), (2, 100));
        assert_eq!(r.levels_gained(), 1);
    }

    #[test]
    fn just_below_threshold_stays() {
        let r = apply_experience(1, 0, 99).unwrap();
        assert_eq!((r.new_level, r.new_experience), (1, 99));
    }

    #[test]
    fn level_cap_keeps_surplus() {
        let r = apply_experience(99, 9800, 100_000).unwrap();
        assert_eq!((r.new_level, r.new_experience), (99, 109_800));
    }

    #[test]
    fn large_grant_climbs_several_levels() {
        // Thresholds 100, 200, 300, 400: 450 total lands on level 5.
        let r = apply_experience(1, 0, 450).unwrap();
        assert_eq!(r.new_level, 5);
        assert_eq!(r.levels_gained(), 4);
    }

    #[test]
    fn experience_saturates_at_storable_maximum() {
        let r = apply_experience(99, MAX_EXPERIENCE - 10, u64::MAX).unwrap();
        assert_eq!(r.new_experience, MAX_EXPERIENCE);

        let r = apply_experience(1, 0, u64::MAX).unwrap();
        assert_eq!((r.new_level, r.new_experience), (MAX_LEVEL, MAX_EXPERIENCE));
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        assert!(apply_experience(0, 0, 10).is_err());
        assert!(apply_experience(100, 0, 10).is_err());
    }

    #[test]
    fn negative_grant_is_rejected() {
        let err = apply_signed_experience(1, 0, -5).unwrap_err();
        assert!(matches!(err, GatheringError::InvalidInput { ref field, .. } if field == "xp_gained"));
        assert_eq!(apply_signed_experience(1, 0, 100).unwrap().new_level, 2);
    }

    #[test]
    fn progress_bar_uses_cumulative_experience() {
        assert_eq!(level_progress(2, 110), 0.55);
        assert_eq!(level_progress(99, 0), 1.0);
        assert_eq!(experience_to_next_level(2, 110), 90);
        assert_eq!(experience_to_next_level(99, 5), 0);
    }

    #[test]
    fn grant_updates_record() {
        let now = Utc::now();
        let mut record = SkillRecord::fresh("hero", SkillType::Mining, now);
        record.experience = 60;
        let r = record.grant(50, now).unwrap();
        assert_eq!(r.new_level, 2);
        assert_eq!(record.level, 2);
        assert_eq!(record.experience, 110);
    }
}
