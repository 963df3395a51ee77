mod leveling;

pub use leveling::{
    apply_experience, apply_signed_experience, experience_to_next_level, level_progress,
    threshold_for, LevelResult, SkillRecord, MAX_EXPERIENCE, MAX_LEVEL, MIN_LEVEL, XP_PER_LEVEL,
};
