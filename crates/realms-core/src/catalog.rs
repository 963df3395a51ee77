//! Read-only material definitions.
//!
//! The engine only needs `gathering_time_ms` and `experience_reward` per
//! material id. A built-in starter catalog ships with the crate and can be
//! replaced by a TOML file:
//!
//! ```toml
//! [[materials]]
//! id = "oak_log"
//! name = "Oak Log"
//! skill_type = "woodcutting"
//! gathering_time_ms = 3000
//! experience_reward = 5
//! required_level = 1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, GatheringError};
use crate::gathering::SkillType;
use crate::skills::{MAX_EXPERIENCE, MAX_LEVEL, MIN_LEVEL};

/// Largest per-unit reward; keeps `reward * quantity` storable for any goal.
pub const MAX_EXPERIENCE_REWARD: u64 = MAX_EXPERIENCE / u32::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub skill_type: SkillType,
    /// Time to produce one unit.
    pub gathering_time_ms: u64,
    /// Experience per unit gathered.
    pub experience_reward: u64,
    #[serde(default = "default_required_level")]
    pub required_level: u32,
}

fn default_required_level() -> u32 {
    MIN_LEVEL
}

/// Lookup of material definitions by id.
pub trait MaterialCatalog {
    fn get(&self, material_id: &str) -> Option<&Material>;

    fn all(&self) -> Vec<&Material>;

    /// Like [`MaterialCatalog::get`] but reports a missing id as an error.
    fn require(&self, material_id: &str) -> Result<&Material, GatheringError> {
        self.get(material_id)
            .ok_or_else(|| GatheringError::MaterialNotFound {
                material_id: material_id.to_string(),
            })
    }

    fn for_skill(&self, skill_type: SkillType) -> Vec<&Material> {
        self.all()
            .into_iter()
            .filter(|m| m.skill_type == skill_type)
            .collect()
    }
}

/// In-memory catalog keyed by material id.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    materials: BTreeMap<String, Material>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    materials: Vec<Material>,
}

impl StaticCatalog {
    /// Build a catalog, rejecting zero gathering times, oversized rewards,
    /// bad levels and duplicate ids.
    ///
    /// # Errors
    /// Returns `InvalidInput` naming the offending material.
    pub fn new(materials: Vec<Material>) -> Result<Self, GatheringError> {
        let mut map = BTreeMap::new();
        for material in materials {
            if material.gathering_time_ms == 0 {
                return Err(GatheringError::invalid(
                    "gathering_time_ms",
                    format!("material '{}' must take longer than 0 ms", material.id),
                ));
            }
            if material.experience_reward > MAX_EXPERIENCE_REWARD {
                return Err(GatheringError::invalid(
                    "experience_reward",
                    format!(
                        "material '{}' rewards more than {MAX_EXPERIENCE_REWARD} per unit",
                        material.id
                    ),
                ));
            }
            if !(MIN_LEVEL..=MAX_LEVEL).contains(&material.required_level) {
                return Err(GatheringError::invalid(
                    "required_level",
                    format!("material '{}' requires level {}", material.id, material.required_level),
                ));
            }
            if map.contains_key(&material.id) {
                return Err(GatheringError::invalid(
                    "id",
                    format!("duplicate material '{}'", material.id),
                ));
            }
            map.insert(material.id.clone(), material);
        }
        Ok(Self { materials: map })
    }

    /// Parse a catalog from TOML text.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` on malformed TOML or invalid entries.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| ConfigError::InvalidValue {
            key: "materials".into(),
            message: e.to_string(),
        })?;
        Self::new(file.materials).map_err(|e| ConfigError::InvalidValue {
            key: "materials".into(),
            message: e.to_string(),
        })
    }

    /// Load a catalog file from disk.
    ///
    /// # Errors
    /// Returns `ConfigError::LoadFailed` if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Starter materials, a few per skill.
    pub fn builtin() -> Self {
        let entries: [(&str, &str, SkillType, u64, u64, u32); 14] = [
            ("oak_log", "Oak Log", SkillType::Woodcutting, 3_000, 5, 1),
            ("willow_log", "Willow Log", SkillType::Woodcutting, 5_000, 12, 10),
            ("yew_log", "Yew Log", SkillType::Woodcutting, 9_000, 30, 30),
            ("copper_ore", "Copper Ore", SkillType::Mining, 3_500, 6, 1),
            ("iron_ore", "Iron Ore", SkillType::Mining, 6_000, 15, 15),
            ("mithril_ore", "Mithril Ore", SkillType::Mining, 12_000, 45, 40),
            ("shrimp", "Shrimp", SkillType::Fishing, 2_500, 4, 1),
            ("trout", "Trout", SkillType::Fishing, 5_500, 14, 12),
            ("rabbit_pelt", "Rabbit Pelt", SkillType::Hunting, 4_000, 7, 1),
            ("wolf_pelt", "Wolf Pelt", SkillType::Hunting, 8_000, 22, 20),
            ("moonpetal", "Moonpetal", SkillType::Alchemy, 4_500, 8, 1),
            ("glowcap", "Glowcap", SkillType::Alchemy, 7_000, 18, 18),
            ("mana_shard", "Mana Shard", SkillType::Magic, 5_000, 10, 1),
            ("arcane_crystal", "Arcane Crystal", SkillType::Magic, 10_000, 35, 35),
        ];

        let materials = entries
            .into_iter()
            .map(|(id, name, skill_type, ms, xp, level)| {
                (
                    id.to_string(),
                    Material {
                        id: id.to_string(),
                        name: name.to_string(),
                        skill_type,
                        gathering_time_ms: ms,
                        experience_reward: xp,
                        required_level: level,
                    },
                )
            })
            .collect();
        Self { materials }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl MaterialCatalog for StaticCatalog {
    fn get(&self, material_id: &str) -> Option<&Material> {
        self.materials.get(material_id)
    }

    fn all(&self) -> Vec<&Material> {
        self.materials.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(id: &str, ms: u64) -> Material {
        Material {
            id: id.into(),
            name: id.into(),
            skill_type: SkillType::Mining,
            gathering_time_ms: ms,
            experience_reward: 1,
            required_level: 1,
        }
    }

    #[test]
    fn builtin_covers_every_skill() {
        let catalog = StaticCatalog::builtin();
        for skill in SkillType::ALL {
            assert!(!catalog.for_skill(skill).is_empty(), "no material for {skill}");
        }
        assert!(catalog.all().iter().all(|m| m.gathering_time_ms > 0));
    }

    #[test]
    fn require_reports_missing_material() {
        let catalog = StaticCatalog::builtin();
        assert_eq!(catalog.require("oak_log").unwrap().experience_reward, 5);
        assert!(matches!(
            catalog.require("dragon_scale"),
            Err(GatheringError::MaterialNotFound { .. })
        ));
    }

    #[test]
    fn rejects_zero_gathering_time() {
        assert!(StaticCatalog::new(vec![material("bad", 0)]).is_err());
    }

    #[test]
    fn rejects_unstorable_reward() {
        let mut greedy = material("greedy", 10);
        greedy.experience_reward = i64::MAX as u64;
        let err = StaticCatalog::new(vec![greedy]).unwrap_err();
        assert!(matches!(err, GatheringError::InvalidInput { ref field, .. } if field == "experience_reward"));

        let mut capped = material("capped", 10);
        capped.experience_reward = MAX_EXPERIENCE_REWARD;
        assert!(StaticCatalog::new(vec![capped]).is_ok());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = StaticCatalog::new(vec![material("ore", 10), material("ore", 20)]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_toml_catalog() {
        let catalog = StaticCatalog::from_toml_str(
            r#"
            [[materials]]
            id = "tin_ore"
            name = "Tin Ore"
            skill_type = "mining"
            gathering_time_ms = 2000
            experience_reward = 3
            "#,
        )
        .unwrap();
        let tin = catalog.get("tin_ore").unwrap();
        assert_eq!(tin.required_level, 1);
        assert_eq!(tin.skill_type, SkillType::Mining);
    }

    #[test]
    fn unreadable_catalog_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = StaticCatalog::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { ref path, .. } if path == &missing));
    }

    #[test]
    fn toml_with_unknown_skill_fails() {
        let result = StaticCatalog::from_toml_str(
            r#"
            [[materials]]
            id = "x"
            name = "X"
            skill_type = "cooking"
            gathering_time_ms = 2000
            experience_reward = 3
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
