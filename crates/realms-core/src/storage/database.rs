//! SQLite persistence for gathering sessions, skills and inventory.
//!
//! Row-level helpers take a plain `&Connection` so the service can run
//! several of them inside one transaction. Session writes are conditional on
//! the row's `version`; a `false` return means the row changed or vanished
//! since it was read.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError};
use crate::gathering::{GatheringSession, SkillType};
use crate::skills::SkillRecord;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub character_id: String,
    pub material_id: String,
    pub quantity: u64,
}

/// SQLite database holding all persistent game state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/realms.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("realms.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(DatabaseError::from)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, CoreError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Begin a write transaction.
    ///
    /// Takes the write lock up front so a read-modify-write cannot interleave
    /// with another writer on the same file.
    ///
    /// # Errors
    /// Returns `DatabaseError::Locked` if the lock is not available in time.
    pub fn begin(&mut self) -> Result<Transaction<'_>, DatabaseError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    pub fn session(&self, character_id: &str) -> Result<Option<GatheringSession>, DatabaseError> {
        load_session(&self.conn, character_id)
    }

    pub fn skill(
        &self,
        character_id: &str,
        skill_type: SkillType,
    ) -> Result<Option<SkillRecord>, DatabaseError> {
        load_skill(&self.conn, character_id, skill_type)
    }

    pub fn skills(&self, character_id: &str) -> Result<Vec<SkillRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT character_id, skill_type, level, experience, updated_at
             FROM skills WHERE character_id = ?1 ORDER BY skill_type",
        )?;
        let rows = stmt.query_map(params![character_id], RawSkill::from_row)?;
        let mut skills = Vec::new();
        for row in rows {
            skills.push(row?.decode()?);
        }
        Ok(skills)
    }

    pub fn inventory(&self, character_id: &str) -> Result<Vec<InventoryEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT character_id, material_id, quantity
             FROM inventory WHERE character_id = ?1 AND quantity > 0 ORDER BY material_id",
        )?;
        let rows = stmt.query_map(params![character_id], |row| {
            Ok(InventoryEntry {
                character_id: row.get(0)?,
                material_id: row.get(1)?,
                quantity: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// === Row-level helpers ===

pub fn load_session(
    conn: &Connection,
    character_id: &str,
) -> Result<Option<GatheringSession>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, character_id, skill_type, material_id, quantity_goal,
                    quantity_gathered, started_at, last_gathered_at, version
             FROM gathering_sessions WHERE character_id = ?1",
            params![character_id],
            RawSession::from_row,
        )
        .optional()?;
    raw.map(RawSession::decode).transpose()
}

/// Insert a new session. Returns `false` if the character already has one.
pub fn insert_session(conn: &Connection, session: &GatheringSession) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO gathering_sessions
            (character_id, id, skill_type, material_id, quantity_goal,
             quantity_gathered, started_at, last_gathered_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            session.character_id,
            session.id,
            session.skill_type.as_str(),
            session.material_id,
            session.quantity_goal,
            session.quantity_gathered,
            format_ts(session.started_at),
            format_ts(session.last_gathered_at),
            session.version,
        ],
    )?;
    Ok(inserted == 1)
}

/// Persist credited progress if the stored row is still at `expected_version`.
///
/// On success the stored version becomes `expected_version + 1`.
pub fn update_session_progress(
    conn: &Connection,
    session: &GatheringSession,
    expected_version: i64,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE gathering_sessions
         SET quantity_gathered = ?1, last_gathered_at = ?2, version = version + 1
         WHERE id = ?3 AND version = ?4",
        params![
            session.quantity_gathered,
            format_ts(session.last_gathered_at),
            session.id,
            expected_version,
        ],
    )?;
    Ok(updated == 1)
}

/// Delete a session if it is still at `expected_version`.
pub fn delete_session(
    conn: &Connection,
    session_id: &str,
    expected_version: i64,
) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM gathering_sessions WHERE id = ?1 AND version = ?2",
        params![session_id, expected_version],
    )?;
    Ok(deleted == 1)
}

pub fn load_skill(
    conn: &Connection,
    character_id: &str,
    skill_type: SkillType,
) -> Result<Option<SkillRecord>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT character_id, skill_type, level, experience, updated_at
             FROM skills WHERE character_id = ?1 AND skill_type = ?2",
            params![character_id, skill_type.as_str()],
            RawSkill::from_row,
        )
        .optional()?;
    raw.map(RawSkill::decode).transpose()
}

pub fn upsert_skill(conn: &Connection, skill: &SkillRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO skills (character_id, skill_type, level, experience, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(character_id, skill_type) DO UPDATE SET
            level = excluded.level,
            experience = excluded.experience,
            updated_at = excluded.updated_at",
        params![
            skill.character_id,
            skill.skill_type.as_str(),
            skill.level,
            skill.experience,
            format_ts(skill.updated_at),
        ],
    )?;
    Ok(())
}

pub fn add_inventory(
    conn: &Connection,
    character_id: &str,
    material_id: &str,
    quantity: u64,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO inventory (character_id, material_id, quantity)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(character_id, material_id) DO UPDATE SET
            quantity = quantity + excluded.quantity",
        params![character_id, material_id, quantity],
    )?;
    Ok(())
}

// === Encoding ===

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptValue {
            column: column.to_string(),
            message: format!("'{value}': {e}"),
        })
}

fn parse_skill(value: &str) -> Result<SkillType, DatabaseError> {
    value.parse().map_err(|_| DatabaseError::CorruptValue {
        column: "skill_type".into(),
        message: format!("unknown skill '{value}'"),
    })
}

struct RawSession {
    id: String,
    character_id: String,
    skill_type: String,
    material_id: String,
    quantity_goal: u32,
    quantity_gathered: u32,
    started_at: String,
    last_gathered_at: String,
    version: i64,
}

impl RawSession {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            character_id: row.get(1)?,
            skill_type: row.get(2)?,
            material_id: row.get(3)?,
            quantity_goal: row.get(4)?,
            quantity_gathered: row.get(5)?,
            started_at: row.get(6)?,
            last_gathered_at: row.get(7)?,
            version: row.get(8)?,
        })
    }

    fn decode(self) -> Result<GatheringSession, DatabaseError> {
        Ok(GatheringSession {
            id: self.id,
            character_id: self.character_id,
            skill_type: parse_skill(&self.skill_type)?,
            material_id: self.material_id,
            quantity_goal: self.quantity_goal,
            quantity_gathered: self.quantity_gathered,
            started_at: parse_ts("started_at", &self.started_at)?,
            last_gathered_at: parse_ts("last_gathered_at", &self.last_gathered_at)?,
            version: self.version,
        })
    }
}

struct RawSkill {
    character_id: String,
    skill_type: String,
    level: u32,
    experience: u64,
    updated_at: String,
}

impl RawSkill {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            character_id: row.get(0)?,
            skill_type: row.get(1)?,
            level: row.get(2)?,
            experience: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn decode(self) -> Result<SkillRecord, DatabaseError> {
        Ok(SkillRecord {
            character_id: self.character_id,
            skill_type: parse_skill(&self.skill_type)?,
            level: self.level,
            experience: self.experience,
            updated_at: parse_ts("updated_at", &self.updated_at)?,
        })
    }
}
