use chrono::Utc;
use clap::Subcommand;
use realms_core::skills::threshold_for;
use realms_core::{experience_to_next_level, level_progress, SkillRecord, SkillType, MAX_LEVEL};
use serde::Serialize;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum SkillsAction {
    /// All skill tracks
    List,
    /// One skill track
    Show {
        /// woodcutting, mining, fishing, hunting, alchemy or magic
        skill: SkillType,
    },
}

/// Skill record plus the numbers a progress bar needs.
#[derive(Serialize)]
struct SkillView {
    skill_type: SkillType,
    level: u32,
    experience: u64,
    /// Cumulative experience at which the next level is reached.
    next_level_at: Option<u64>,
    to_next_level: u64,
    progress: f64,
}

impl From<&SkillRecord> for SkillView {
    fn from(record: &SkillRecord) -> Self {
        Self {
            skill_type: record.skill_type,
            level: record.level,
            experience: record.experience,
            next_level_at: (record.level < MAX_LEVEL).then(|| threshold_for(record.level)),
            to_next_level: experience_to_next_level(record.level, record.experience),
            progress: level_progress(record.level, record.experience),
        }
    }
}

pub fn run(action: SkillsAction, character: Option<String>) -> CmdResult {
    let ctx = Context::open(character)?;
    let skills = ctx.service.skills(&ctx.character, Utc::now())?;

    match action {
        SkillsAction::List => {
            let views: Vec<SkillView> = skills.iter().map(SkillView::from).collect();
            print_json(&views)?;
        }
        SkillsAction::Show { skill } => {
            if let Some(record) = skills.iter().find(|s| s.skill_type == skill) {
                print_json(&SkillView::from(record))?;
            }
        }
    }
    Ok(())
}

pub fn inventory(character: Option<String>) -> CmdResult {
    let ctx = Context::open(character)?;
    print_json(&ctx.service.inventory(&ctx.character)?)
}
