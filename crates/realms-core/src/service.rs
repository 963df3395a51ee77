//! Session orchestration: start → poll → collect / cancel.
//!
//! Resolves ids to records, runs the pure engine, and applies the result.
//! Every operation is one immediate SQLite transaction; session writes are
//! additionally conditional on the version that was read, so a lost race
//! surfaces as `ConcurrentModification` instead of a double credit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Material, MaterialCatalog};
use crate::error::{GatheringError, Result};
use crate::events::Event;
use crate::gathering::{self, CollectOutcome, GatheringProgress, GatheringSession};
use crate::skills::{SkillRecord, MAX_LEVEL};
use crate::storage::database::{self, Database, InventoryEntry};

/// Snapshot returned by a status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session: GatheringSession,
    pub progress: GatheringProgress,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectReport {
    pub outcome: CollectOutcome,
    pub events: Vec<Event>,
}

pub struct GatheringService<C> {
    db: Database,
    catalog: C,
    max_quantity_goal: u32,
}

impl<C: MaterialCatalog> GatheringService<C> {
    pub fn new(db: Database, catalog: C) -> Self {
        Self {
            db,
            catalog,
            max_quantity_goal: u32::MAX,
        }
    }

    /// Cap the goal a single session may ask for.
    pub fn with_max_quantity_goal(mut self, max: u32) -> Self {
        self.max_quantity_goal = max.max(1);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Begin gathering `material_id` for a character.
    ///
    /// # Errors
    /// - `InvalidInput` for a zero or oversized goal
    /// - `MaterialNotFound`, `LevelTooLow`, `SessionAlreadyActive`
    pub fn start(
        &mut self,
        character_id: &str,
        material_id: &str,
        quantity_goal: u32,
        now: DateTime<Utc>,
    ) -> Result<(GatheringSession, Event)> {
        if quantity_goal > self.max_quantity_goal {
            return Err(GatheringError::invalid(
                "quantity_goal",
                format!("must not exceed {}", self.max_quantity_goal),
            )
            .into());
        }
        let material = self.catalog.require(material_id)?.clone();
        let session = GatheringSession::new(
            character_id,
            material.skill_type,
            &material.id,
            quantity_goal,
            now,
        )?;

        let tx = self.db.begin()?;
        let current_level = database::load_skill(&tx, character_id, material.skill_type)?
            .map(|s| s.level)
            .unwrap_or(1);
        if current_level < material.required_level {
            return Err(GatheringError::LevelTooLow {
                required: material.required_level,
                current: current_level,
            }
            .into());
        }
        if !database::insert_session(&tx, &session)? {
            return Err(GatheringError::SessionAlreadyActive {
                character_id: character_id.to_string(),
            }
            .into());
        }
        tx.commit()?;

        tracing::info!(
            character = character_id,
            material = material_id,
            goal = quantity_goal,
            "gathering started"
        );

        let event = Event::GatheringStarted {
            session_id: session.id.clone(),
            character_id: session.character_id.clone(),
            material_id: session.material_id.clone(),
            skill_type: session.skill_type,
            quantity_goal,
            duration_ms: u64::from(quantity_goal).saturating_mul(material.gathering_time_ms),
            at: now,
        };
        Ok((session, event))
    }

    /// Credit elapsed time and report progress.
    ///
    /// Only writes when whole units were credited.
    ///
    /// # Errors
    /// `SessionNotFound`, `MaterialNotFound`, or `ConcurrentModification`.
    pub fn status(&mut self, character_id: &str, now: DateTime<Utc>) -> Result<SessionStatus> {
        let tx = self.db.begin()?;
        let mut session = require_session(&tx, character_id)?;
        let material = material_for(&self.catalog, &session)?;

        let expected_version = session.version;
        let progress = gathering::advance(&mut session, material.gathering_time_ms, now)?;
        let mut events = Vec::new();

        if progress.changed() {
            if !database::update_session_progress(&tx, &session, expected_version)? {
                return Err(conflict(character_id));
            }
            tx.commit()?;
            session.version = expected_version + 1;

            tracing::debug!(
                character = character_id,
                credited = progress.units_credited,
                gathered = progress.quantity_gathered,
                goal = progress.quantity_goal,
                "gathering progress credited"
            );
            events.push(Event::GatheringProgressed {
                session_id: session.id.clone(),
                character_id: session.character_id.clone(),
                units_credited: progress.units_credited,
                quantity_gathered: progress.quantity_gathered,
                quantity_goal: progress.quantity_goal,
                at: now,
            });
            if progress.is_complete {
                events.push(Event::GatheringCompleted {
                    session_id: session.id.clone(),
                    character_id: session.character_id.clone(),
                    quantity_gathered: progress.quantity_gathered,
                    at: now,
                });
            }
        }

        Ok(SessionStatus {
            session,
            progress,
            events,
        })
    }

    /// Turn a completed session into inventory and skill experience.
    ///
    /// Skill update, inventory credit and session removal commit together
    /// or not at all.
    ///
    /// # Errors
    /// `SessionNotFound`, `NotComplete`, `MaterialNotFound`, or
    /// `ConcurrentModification`.
    pub fn collect(&mut self, character_id: &str, now: DateTime<Utc>) -> Result<CollectReport> {
        let tx = self.db.begin()?;
        let mut session = require_session(&tx, character_id)?;
        let material = material_for(&self.catalog, &session)?;
        let skill = database::load_skill(&tx, character_id, session.skill_type)?;

        let expected_version = session.version;
        let outcome = gathering::collect(&mut session, &material, skill, now)?;

        if !database::delete_session(&tx, &session.id, expected_version)? {
            return Err(conflict(character_id));
        }
        database::upsert_skill(&tx, &outcome.skill)?;
        database::add_inventory(
            &tx,
            &outcome.character_id,
            &outcome.material_id,
            u64::from(outcome.quantity),
        )?;
        tx.commit()?;

        tracing::info!(
            character = character_id,
            material = %outcome.material_id,
            quantity = outcome.quantity,
            xp = outcome.xp_gained,
            "gathering collected"
        );

        let mut events = vec![Event::GatheringCollected {
            session_id: outcome.session_id.clone(),
            character_id: outcome.character_id.clone(),
            material_id: outcome.material_id.clone(),
            quantity: outcome.quantity,
            xp_gained: outcome.xp_gained,
            at: now,
        }];
        if outcome.leveled_up() {
            tracing::info!(
                character = character_id,
                skill = %outcome.skill.skill_type,
                from = outcome.level.previous_level,
                to = outcome.level.new_level,
                "skill level up"
            );
            events.push(Event::SkillLevelUp {
                character_id: outcome.character_id.clone(),
                skill_type: outcome.skill.skill_type,
                from_level: outcome.level.previous_level,
                to_level: outcome.level.new_level,
                experience: outcome.skill.experience,
                at: now,
            });
        }

        Ok(CollectReport { outcome, events })
    }

    /// Abandon the active session. Gathered units are forfeited.
    ///
    /// # Errors
    /// `SessionNotFound` or `ConcurrentModification`.
    pub fn cancel(&mut self, character_id: &str, now: DateTime<Utc>) -> Result<Event> {
        let tx = self.db.begin()?;
        let session = require_session(&tx, character_id)?;
        if !database::delete_session(&tx, &session.id, session.version)? {
            return Err(conflict(character_id));
        }
        tx.commit()?;

        tracing::info!(
            character = character_id,
            forfeited = session.quantity_gathered,
            "gathering cancelled"
        );
        Ok(Event::GatheringCancelled {
            session_id: session.id,
            character_id: session.character_id,
            quantity_forfeited: session.quantity_gathered,
            at: now,
        })
    }

    /// Active session without crediting progress.
    pub fn session(&self, character_id: &str) -> Result<Option<GatheringSession>> {
        Ok(self.db.session(character_id)?)
    }

    /// Every skill track for a character; tracks never granted XP show as
    /// level 1 with no experience.
    pub fn skills(&self, character_id: &str, now: DateTime<Utc>) -> Result<Vec<SkillRecord>> {
        let stored = self.db.skills(character_id)?;
        Ok(gathering::SkillType::ALL
            .into_iter()
            .map(|skill_type| {
                stored
                    .iter()
                    .find(|s| s.skill_type == skill_type)
                    .cloned()
                    .unwrap_or_else(|| SkillRecord::fresh(character_id, skill_type, now))
            })
            .collect())
    }

    pub fn inventory(&self, character_id: &str) -> Result<Vec<InventoryEntry>> {
        Ok(self.db.inventory(character_id)?)
    }

    /// Materials the character's current levels allow starting.
    pub fn available_materials(&self, character_id: &str) -> Result<Vec<&Material>> {
        let stored = self.db.skills(character_id)?;
        let level_of = |material: &Material| {
            stored
                .iter()
                .find(|s| s.skill_type == material.skill_type)
                .map(|s| s.level.min(MAX_LEVEL))
                .unwrap_or(1)
        };
        Ok(self
            .catalog
            .all()
            .into_iter()
            .filter(|m| level_of(m) >= m.required_level)
            .collect())
    }
}

fn require_session(conn: &rusqlite::Connection, character_id: &str) -> Result<GatheringSession> {
    database::load_session(conn, character_id)?.ok_or_else(|| {
        GatheringError::SessionNotFound {
            character_id: character_id.to_string(),
        }
        .into()
    })
}

fn material_for<C: MaterialCatalog>(catalog: &C, session: &GatheringSession) -> Result<Material> {
    Ok(catalog.require(&session.material_id)?.clone())
}

/// A version-guarded write matched no row.
///
/// Immediate transactions already serialize writers on one file, so this
/// fires only when something outside the service touched the session row.
fn conflict(character_id: &str) -> crate::error::CoreError {
    tracing::warn!(character = character_id, "gathering session changed underneath us");
    GatheringError::ConcurrentModification {
        character_id: character_id.to_string(),
    }
    .into()
}
