use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::GatheringError;

/// Gathering skill categories. Each one is a separate leveling track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Woodcutting,
    Mining,
    Fishing,
    Hunting,
    Alchemy,
    Magic,
}

impl SkillType {
    pub const ALL: [SkillType; 6] = [
        SkillType::Woodcutting,
        SkillType::Mining,
        SkillType::Fishing,
        SkillType::Hunting,
        SkillType::Alchemy,
        SkillType::Magic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::Woodcutting => "woodcutting",
            SkillType::Mining => "mining",
            SkillType::Fishing => "fishing",
            SkillType::Hunting => "hunting",
            SkillType::Alchemy => "alchemy",
            SkillType::Magic => "magic",
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillType {
    type Err = GatheringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillType::ALL
            .into_iter()
            .find(|skill| skill.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GatheringError::invalid("skill_type", format!("unknown skill '{s}'")))
    }
}

/// An in-progress timed gather for one character and one material.
///
/// `last_gathered_at` marks how far elapsed time has been converted into
/// units. It only moves when whole units are credited, so frequent polling
/// never double-counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatheringSession {
    pub id: String,
    pub character_id: String,
    pub skill_type: SkillType,
    pub material_id: String,
    pub quantity_goal: u32,
    pub quantity_gathered: u32,
    pub started_at: DateTime<Utc>,
    pub last_gathered_at: DateTime<Utc>,
    /// Bumped on every persisted mutation; guards conditional writes.
    #[serde(default)]
    pub version: i64,
}

impl GatheringSession {
    /// Create a fresh session with nothing gathered yet.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty id or a zero goal.
    pub fn new(
        character_id: &str,
        skill_type: SkillType,
        material_id: &str,
        quantity_goal: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, GatheringError> {
        if character_id.trim().is_empty() {
            return Err(GatheringError::invalid("character_id", "must not be empty"));
        }
        if material_id.trim().is_empty() {
            return Err(GatheringError::invalid("material_id", "must not be empty"));
        }
        validate_goal(quantity_goal)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            character_id: character_id.to_string(),
            skill_type,
            material_id: material_id.to_string(),
            quantity_goal,
            quantity_gathered: 0,
            started_at: now,
            last_gathered_at: now,
            version: 0,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.quantity_gathered >= self.quantity_goal
    }

    pub fn remaining_units(&self) -> u32 {
        self.quantity_goal.saturating_sub(self.quantity_gathered)
    }
}

pub(crate) fn validate_goal(quantity_goal: u32) -> Result<(), GatheringError> {
    if quantity_goal == 0 {
        return Err(GatheringError::invalid("quantity_goal", "must be at least 1"));
    }
    Ok(())
}
