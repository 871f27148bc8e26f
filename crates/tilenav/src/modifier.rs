//! Modifier resolution: tile identity → area classification
//!
//! Двухуровневый lookup:
//! 1. Явная запись для тайла (per-tile-type area)
//! 2. Override area (грубый fallback для больших однородных регионов), если включён
//!
//! Если нет ни записи, ни override — результат `None`, и вызывающий ОБЯЗАН оставить
//! предыдущую классификацию (не подставлять default).

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::TileId;

/// Area classification (passability/cost tag ячейки)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, Reflect,
)]
pub enum AreaType {
    /// Непроходимо (стены, пропасти)
    NotWalkable,
    /// Обычная поверхность
    #[default]
    Walkable,
    /// Дорога (дешевле обычной)
    Road,
    /// Пересечённая местность
    Rough,
    /// Мелкая вода
    Water,
    /// Опасная зона (огонь, кислота) — проходимо, но дорого
    Hazard,
}

impl AreaType {
    /// Стоимость прохода ячейки; `None` для непроходимых
    pub fn traversal_cost(self) -> Option<f32> {
        match self {
            AreaType::NotWalkable => None,
            AreaType::Walkable => Some(1.0),
            AreaType::Road => Some(0.5),
            AreaType::Rough => Some(2.0),
            AreaType::Water => Some(3.0),
            AreaType::Hazard => Some(10.0),
        }
    }

    pub fn is_walkable(self) -> bool {
        self.traversal_cost().is_some()
    }
}

/// Одна запись таблицы модификаторов (JSON-friendly форма)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub tile: TileId,
    pub area: AreaType,
}

/// Конфиг модификаторов (секция `modifiers` в nav config)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileModifierConfig {
    pub entries: Vec<ModifierEntry>,
    /// Включает fallback на `override_value` для тайлов без записи
    pub override_area: bool,
    pub override_value: AreaType,
}

/// Tile modifier mapping (Resource)
#[derive(Resource, Debug, Clone, Default)]
pub struct TileModifier {
    areas: HashMap<TileId, AreaType>,
    pub override_area: bool,
    pub override_value: AreaType,
}

impl TileModifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TileModifierConfig) -> Self {
        // Дубликаты тайлов: последняя запись выигрывает
        let areas = config
            .entries
            .iter()
            .map(|entry| (entry.tile, entry.area))
            .collect();
        Self {
            areas,
            override_area: config.override_area,
            override_value: config.override_value,
        }
    }

    pub fn with_area(mut self, tile: TileId, area: AreaType) -> Self {
        self.set_area(tile, area);
        self
    }

    pub fn with_override(mut self, area: AreaType) -> Self {
        self.override_area = true;
        self.override_value = area;
        self
    }

    pub fn set_area(&mut self, tile: TileId, area: AreaType) {
        self.areas.insert(tile, area);
    }

    pub fn remove_area(&mut self, tile: TileId) -> Option<AreaType> {
        self.areas.remove(&tile)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Resolve area для тайла: запись → override → `None`
    pub fn resolve(&self, tile: TileId) -> Option<AreaType> {
        self.areas.get(&tile).copied().or_else(|| self.fallback())
    }

    /// Resolve area для содержимого ячейки
    ///
    /// Пустая ячейка (`None`) не имеет записи — идёт только через override.
    pub fn resolve_cell(&self, tile: Option<TileId>) -> Option<AreaType> {
        match tile {
            Some(tile) => self.resolve(tile),
            None => self.fallback(),
        }
    }

    fn fallback(&self) -> Option<AreaType> {
        self.override_area.then_some(self.override_value)
    }
}
