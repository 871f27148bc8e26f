//! Nav cache configuration (JSON)
//!
//! Builtin конфиг вшит через `include_str!`; override — `from_file` / `from_json_str`.
//! Все поля опциональны (`#[serde(default)]`).

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::NavConfigError;
use crate::grid::GridLayout;
use crate::modifier::TileModifierConfig;
use crate::rebuild::NavBuildSettings;

pub const BUILTIN_NAV_CONFIG: &str = include_str!("data/nav_config.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavCacheConfig {
    pub layout: GridLayout,
    pub modifiers: TileModifierConfig,
    pub build: NavBuildSettings,
}

impl NavCacheConfig {
    /// Builtin конфиг; при ошибке парсинга — defaults + error в лог
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_NAV_CONFIG).unwrap_or_else(|err| {
            crate::logger::log_error(&format!("❌ Builtin nav config is invalid: {}", err));
            Self::default()
        })
    }

    /// Парсинг + проверка layout (нулевой размер ячейки схлопнул бы все sources в одну)
    pub fn from_json_str(json: &str) -> Result<Self, NavConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NavConfigError> {
        if !self.layout.is_valid() {
            return Err(NavConfigError::InvalidLayout {
                cell_size: self.layout.cell_size,
            });
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, NavConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| NavConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;
    use crate::grid::TileId;
    use crate::modifier::{AreaType, TileModifier};

    #[test]
    fn test_builtin_config_parses() {
        let config = NavCacheConfig::from_json_str(BUILTIN_NAV_CONFIG).unwrap();

        assert!(!config.modifiers.entries.is_empty());
        assert!(config.build.cell_size > 0.0);
        assert_eq!(config.layout.cell_size.x, 1.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "modifiers": {
                "entries": [ { "tile": 7, "area": "Water" } ],
                "override_area": true,
                "override_value": "NotWalkable"
            }
        }"#;
        let config = NavCacheConfig::from_json_str(json).unwrap();
        let modifier = TileModifier::from_config(&config.modifiers);

        assert_eq!(modifier.resolve(TileId(7)), Some(AreaType::Water));
        assert_eq!(modifier.resolve(TileId(8)), Some(AreaType::NotWalkable));
        assert_eq!(config.build, NavBuildSettings::default());
        assert_eq!(config.layout, GridLayout::default());
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let result = NavCacheConfig::from_json_str(r#"{ "modifiers": { "entries": 5 } }"#);
        assert!(matches!(result, Err(NavConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_cell_size_is_rejected() {
        let json = r#"{ "layout": { "cell_size": [1.0, 0.0, 1.0] } }"#;
        let result = NavCacheConfig::from_json_str(json);

        assert!(matches!(
            result,
            Err(NavConfigError::InvalidLayout { cell_size }) if cell_size.y == 0.0
        ));
    }

    #[test]
    fn test_negative_cell_size_is_rejected() {
        let config = NavCacheConfig {
            layout: GridLayout {
                cell_size: Vec3::new(-1.0, 1.0, 1.0),
                origin: Vec3::ZERO,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(NavCacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = NavCacheConfig::from_file(Path::new("/nonexistent/tilenav/nav_config.json"));
        assert!(matches!(result, Err(NavConfigError::Read { .. })));
    }
}
