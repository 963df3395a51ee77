//! # Eternal Realms Core Library
//!
//! The gathering engine behind Eternal Realms: timed resource gathering that
//! accrues yield from wall-clock time, and the skill leveling that turns the
//! yield into experience. Front ends (the CLI today) are thin layers over
//! this crate.
//!
//! ## Architecture
//!
//! - **Gathering engine**: pure functions over a session and `now`. There is
//!   no internal thread; the caller polls at whatever cadence it likes.
//! - **Leveling**: cumulative experience against a `level × 100` threshold,
//!   capped at level 99.
//! - **Service**: start/status/collect/cancel, each applied in one SQLite
//!   transaction with version-checked session writes.
//! - **Storage**: SQLite persistence and TOML configuration.
//!
//! ## Key Components
//!
//! - [`advance`] / [`calculate`]: progress calculator
//! - [`apply_experience`]: leveling function
//! - [`collect`]: yield → experience → leveling for a finished session
//! - [`GatheringService`]: orchestration over [`Database`]
//! - [`MaterialCatalog`]: material lookup
//! - [`Config`]: application configuration

pub mod catalog;
pub mod error;
pub mod events;
pub mod gathering;
pub mod service;
pub mod skills;
pub mod storage;

pub use catalog::{Material, MaterialCatalog, StaticCatalog, MAX_EXPERIENCE_REWARD};
pub use error::{ConfigError, CoreError, DatabaseError, GatheringError};
pub use events::Event;
pub use gathering::{
    advance, calculate, collect, CollectOutcome, GatheringProgress, GatheringSession, SkillType,
};
pub use service::{CollectReport, GatheringService, SessionStatus};
pub use skills::{
    apply_experience, experience_to_next_level, level_progress, LevelResult, SkillRecord,
    MAX_EXPERIENCE, MAX_LEVEL,
};
pub use storage::{Config, Database, InventoryEntry};
