//! Navigation builder service (outbound collaborator)
//!
//! Core не знает как строится nav structure (триангуляция/вокселизация — снаружи).
//! Сервис получает snapshot source list + bounds + opaque settings и возвращает `NavSurface`.
//! Вызывается из `AsyncComputeTaskPool`, поэтому `Send + Sync`.

use std::collections::{BTreeMap, HashSet};

use crate::grid::{CellCoord, GridLayout};
use crate::source::{BuildSource, SourceList};

use super::settings::{BakeBounds, NavBuildSettings};

/// Snapshot source list для фонового rebuild (сам список остаётся у кэша)
#[derive(Debug, Clone)]
pub struct RebuildInput {
    pub generation: u64,
    pub layout: GridLayout,
    pub sources: Vec<BuildSource>,
}

impl RebuildInput {
    pub fn snapshot(list: &SourceList) -> Self {
        Self {
            generation: list.generation(),
            layout: *list.layout(),
            sources: list.as_slice().to_vec(),
        }
    }
}

/// Результат rebuild: derived nav structure внутри bounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavSurface {
    pub bounds: Option<BakeBounds>,
    /// Generation source list, из которого построено
    pub source_generation: u64,
    /// Проходимые ячейки → стоимость прохода
    pub walkable: BTreeMap<CellCoord, f32>,
    /// Непроходимые ячейки (включая съеденные agent radius)
    pub blocked: usize,
    /// Sources внутри bounds
    pub sources_considered: usize,
}

impl NavSurface {
    pub fn cost_at(&self, coord: CellCoord) -> Option<f32> {
        self.walkable.get(&coord).copied()
    }

    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.walkable.contains_key(&coord)
    }
}

pub trait NavBuildService: Send + Sync + 'static {
    fn build(&self, input: &RebuildInput, bounds: BakeBounds, settings: &NavBuildSettings) -> NavSurface;
}

/// Reference builder: per-cell cost field
///
/// Проходимая ячейка получает стоимость своей area. Ячейки ближе `agent_radius` к
/// непроходимому source (в пределах одного layer) считаются заблокированными.
/// Препятствия собираются из bounds, расширенных на `agent_radius`: стена сразу
/// за границей тоже съедает соседние ячейки.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostFieldBuilder;

impl NavBuildService for CostFieldBuilder {
    fn build(&self, input: &RebuildInput, bounds: BakeBounds, settings: &NavBuildSettings) -> NavSurface {
        let layout = input.layout;
        let mut walkable = BTreeMap::new();
        let mut obstacles = HashSet::new();
        let mut sources_considered = 0;
        let mut blocked = 0;
        let margin = bounds.expanded(settings.agent_radius.max(0.0));

        for source in &input.sources {
            let position = source.transform.translation;
            let inside = bounds.contains(position);
            if !inside && !margin.contains(position) {
                continue;
            }

            let coord = source.origin_cell(&layout);
            match source.area.traversal_cost() {
                Some(cost) if inside => {
                    walkable.insert(coord, cost);
                }
                Some(_) => {}
                None => {
                    obstacles.insert(coord);
                    if inside {
                        blocked += 1;
                    }
                }
            }
            if inside {
                sources_considered += 1;
            }
        }

        let erosion = erosion_radius_cells(&layout, settings.agent_radius);
        if erosion > 0 && !obstacles.is_empty() {
            let before = walkable.len();
            walkable.retain(|coord, _| !near_obstacle(*coord, &obstacles, erosion));
            blocked += before - walkable.len();
        }

        NavSurface {
            bounds: Some(bounds),
            source_generation: input.generation,
            walkable,
            blocked,
            sources_considered,
        }
    }
}

/// Сколько соседних ячеек съедает радиус агента (меньше половины ячейки — ноль)
fn erosion_radius_cells(layout: &GridLayout, agent_radius: f32) -> i32 {
    let horizontal = layout.cell_size.x.min(layout.cell_size.z);
    if horizontal <= 0.0 {
        return 0;
    }
    ((agent_radius - horizontal * 0.5) / horizontal).ceil().max(0.0) as i32
}

fn near_obstacle(coord: CellCoord, obstacles: &HashSet<CellCoord>, radius: i32) -> bool {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let neighbor = CellCoord::new(coord.x + dx, coord.y + dy, coord.layer);
            if obstacles.contains(&neighbor) {
                return true;
            }
        }
    }
    false
}
