pub mod config;
pub mod gather;
pub mod materials;
pub mod skills;

use realms_core::{Config, Database, GatheringService, StaticCatalog};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a game command needs: config, resolved character, service.
pub struct Context {
    pub config: Config,
    pub character: String,
    pub service: GatheringService<StaticCatalog>,
}

impl Context {
    pub fn open(character: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let catalog = config.catalog()?;
        let service = GatheringService::new(Database::open()?, catalog)
            .with_max_quantity_goal(config.gathering.max_quantity_goal);
        let character = character.unwrap_or_else(|| config.character_id.clone());
        tracing::debug!(character = %character, catalog = service.catalog().len(), "game data opened");
        Ok(Self {
            config,
            character,
            service,
        })
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
