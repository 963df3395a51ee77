//! Yield → experience → leveling for a finished session.
//!
//! This computes everything a collect writes without writing it. The
//! orchestration layer applies the outcome in one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::progress::advance;
use super::session::GatheringSession;
use crate::catalog::Material;
use crate::error::GatheringError;
use crate::skills::{LevelResult, SkillRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectOutcome {
    pub session_id: String,
    pub character_id: String,
    pub material_id: String,
    /// Units moved into inventory.
    pub quantity: u32,
    pub xp_gained: u64,
    pub level: LevelResult,
    /// The skill record after the grant.
    pub skill: SkillRecord,
}

impl CollectOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level.levels_gained() > 0
    }
}

/// Finalize a session: credit outstanding units, require completion, then
/// grant `experience_reward × quantity_gathered` to the session's skill.
///
/// `skill` is the character's current record for the session's skill, or
/// `None` if it does not exist yet.
///
/// # Errors
/// - `InvalidInput` if the material or skill record does not belong to the session
/// - `NotComplete` if fewer than `quantity_goal` units have been gathered at `now`
pub fn collect(
    session: &mut GatheringSession,
    material: &Material,
    skill: Option<SkillRecord>,
    now: DateTime<Utc>,
) -> Result<CollectOutcome, GatheringError> {
    if material.id != session.material_id {
        return Err(GatheringError::invalid(
            "material_id",
            format!(
                "session gathers '{}', not '{}'",
                session.material_id, material.id
            ),
        ));
    }

    let progress = advance(session, material.gathering_time_ms, now)?;
    if !progress.is_complete {
        return Err(GatheringError::NotComplete {
            gathered: progress.quantity_gathered,
            goal: progress.quantity_goal,
        });
    }

    let mut skill =
        skill.unwrap_or_else(|| SkillRecord::fresh(&session.character_id, session.skill_type, now));
    if skill.character_id != session.character_id || skill.skill_type != session.skill_type {
        return Err(GatheringError::invalid(
            "skill",
            format!(
                "record is {}/{}, session needs {}/{}",
                skill.character_id, skill.skill_type, session.character_id, session.skill_type
            ),
        ));
    }

    let quantity = progress.quantity_gathered;
    let xp_gained = material.experience_reward.saturating_mul(u64::from(quantity));
    let level = skill.grant(xp_gained, now)?;

    Ok(CollectOutcome {
        session_id: session.id.clone(),
        character_id: session.character_id.clone(),
        material_id: session.material_id.clone(),
        quantity,
        xp_gained,
        level,
        skill,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gathering::SkillType;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn oak() -> Material {
        Material {
            id: "oak_log".into(),
            name: "Oak Log".into(),
            skill_type: SkillType::Woodcutting,
            gathering_time_ms: 3000,
            experience_reward: 5,
            required_level: 1,
        }
    }

    fn session() -> GatheringSession {
        GatheringSession::new("hero", SkillType::Woodcutting, "oak_log", 10, t0()).unwrap()
    }

    #[test]
    fn completed_session_levels_existing_skill() {
        let mut s = session();
        let mut skill = SkillRecord::fresh("hero", SkillType::Woodcutting, t0());
        skill.experience = 60;

        let out = collect(&mut s, &oak(), Some(skill), t0() + Duration::seconds(30)).unwrap();
        assert_eq!(out.quantity, 10);
        assert_eq!(out.xp_gained, 50);
        assert_eq!(out.skill.level, 2);
        assert_eq!(out.skill.experience, 110);
        assert!(out.leveled_up());
    }

    #[test]
    fn missing_skill_is_created_at_level_one() {
        let mut s = session();
        let out = collect(&mut s, &oak(), None, t0() + Duration::seconds(30)).unwrap();
        assert_eq!(out.level.previous_level, 1);
        assert_eq!(out.skill.experience, 50);
        assert_eq!(out.skill.level, 1);
        assert!(!out.leveled_up());
    }

    #[test]
    fn incomplete_session_is_rejected() {
        let mut s = session();
        let err = collect(&mut s, &oak(), None, t0() + Duration::milliseconds(9500)).unwrap_err();
        assert_eq!(err, GatheringError::NotComplete { gathered: 3, goal: 10 });
    }

    #[test]
    fn wrong_material_is_rejected() {
        let mut s = session();
        let mut other = oak();
        other.id = "willow_log".into();
        assert!(matches!(
            collect(&mut s, &other, None, t0() + Duration::seconds(30)),
            Err(GatheringError::InvalidInput { .. })
        ));
    }

    #[test]
    fn foreign_skill_record_is_rejected() {
        let mut s = session();
        let skill = SkillRecord::fresh("hero", SkillType::Mining, t0());
        assert!(collect(&mut s, &oak(), Some(skill), t0() + Duration::seconds(30)).is_err());
    }
}
