mod collect;
mod progress;
mod session;

pub use collect::{collect, CollectOutcome};
pub use progress::{advance, calculate, GatheringProgress};
pub use session::{GatheringSession, SkillType};
