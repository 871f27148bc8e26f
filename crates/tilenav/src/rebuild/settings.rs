//! Build settings для nav builder service
//!
//! Core эти параметры не интерпретирует — передаёт как есть в `NavBuildService`.
//! Исключение: `default_area` и `collect_volume` читает owning builder при коллекции.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::modifier::AreaType;

/// Axis-aligned bounds (position = min corner, size = extent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BakeBounds {
    pub position: Vec3,
    pub size: Vec3,
}

impl BakeBounds {
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self { position, size }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let lo = min.min(max);
        let hi = min.max(max);
        Self {
            position: lo,
            size: hi - lo,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.position
    }

    pub fn max(&self) -> Vec3 {
        self.position + self.size
    }

    /// Точка внутри (границы включительно)
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }

    /// Минимальные bounds, покрывающие оба
    pub fn union(&self, other: &BakeBounds) -> BakeBounds {
        BakeBounds::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Расширить во все стороны на `margin`
    pub fn expanded(&self, margin: f32) -> BakeBounds {
        BakeBounds::from_min_max(self.min() - Vec3::splat(margin), self.max() + Vec3::splat(margin))
    }
}

/// Параметры nav build (настройки алгоритма + область)
///
/// Влияют на качество pathfinding и стоимость rebuild.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavBuildSettings {
    /// Размер ячейки вокселизации (меньше = точнее, но дороже)
    pub cell_size: f32,
    /// Высота ячейки вокселизации
    pub cell_height: f32,
    /// Высота агента (проверка проходимости)
    pub agent_height: f32,
    /// Радиус агента — на сколько "съедается" проходимая область у препятствий
    pub agent_radius: f32,
    /// Максимальная высота подъёма (ступени)
    pub agent_max_climb: f32,
    /// Area для тайлов без модификатора при полной коллекции
    pub default_area: AreaType,
    /// Область по умолчанию для rebuild без явных bounds
    pub bake_bounds: BakeBounds,
    /// Если задано — коллекция берёт только ячейки внутри
    pub collect_volume: Option<BakeBounds>,
}

impl Default for NavBuildSettings {
    fn default() -> Self {
        Self {
            cell_size: 0.25,
            cell_height: 0.25,
            agent_height: 1.8,
            agent_radius: 0.5,
            agent_max_climb: 0.5,
            default_area: AreaType::Walkable,
            // По умолчанию 400x400 плоскость, несколько layer'ов по высоте
            bake_bounds: BakeBounds::new(Vec3::new(-200.0, -8.0, -200.0), Vec3::new(400.0, 16.0, 400.0)),
            collect_volume: None,
        }
    }
}
