use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gathering::SkillType;

/// Every state change in the gathering service produces an Event.
/// Front ends print or forward them; nothing in the engine consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    GatheringStarted {
        session_id: String,
        character_id: String,
        material_id: String,
        skill_type: SkillType,
        quantity_goal: u32,
        /// Estimated time until the goal is reached.
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// Whole units were credited on a poll.
    GatheringProgressed {
        session_id: String,
        character_id: String,
        units_credited: u32,
        quantity_gathered: u32,
        quantity_goal: u32,
        at: DateTime<Utc>,
    },
    /// The goal was reached; the session waits to be collected.
    GatheringCompleted {
        session_id: String,
        character_id: String,
        quantity_gathered: u32,
        at: DateTime<Utc>,
    },
    GatheringCollected {
        session_id: String,
        character_id: String,
        material_id: String,
        quantity: u32,
        xp_gained: u64,
        at: DateTime<Utc>,
    },
    /// Session removed without reward.
    GatheringCancelled {
        session_id: String,
        character_id: String,
        quantity_forfeited: u32,
        at: DateTime<Utc>,
    },
    SkillLevelUp {
        character_id: String,
        skill_type: SkillType,
        from_level: u32,
        to_level: u32,
        experience: u64,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::SkillLevelUp {
            character_id: "hero".into(),
            skill_type: SkillType::Fishing,
            from_level: 1,
            to_level: 2,
            experience: 100,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SkillLevelUp");
        assert_eq!(json["skill_type"], "fishing");
    }
}
