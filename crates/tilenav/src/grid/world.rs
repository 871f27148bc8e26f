//! GridWorld — мутабельный тайловый мир (источник build sources)

use std::collections::HashMap;

use bevy::prelude::*;
use rand::Rng;

use super::coord::{CellCoord, GridLayout, TileId};
use super::events::{CellMutation, MutationBatch, SetTileIntent};
use super::feed::MutationFeed;

/// Тайловый грид + очередь изменений + feed подписчиков
///
/// Каждое реальное изменение содержимого ячейки (включая очистку) попадает в pending
/// и публикуется одним batch'ем в `publish_grid_mutations`.
#[derive(Resource, Debug, Default)]
pub struct GridWorld {
    pub layout: GridLayout,
    cells: HashMap<CellCoord, TileId>,
    pending: Vec<CellMutation>,
    feed: MutationFeed,
}

impl GridWorld {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    /// Начальное заполнение (без mutation events — до первой коллекции слушать некому)
    pub fn from_cells(layout: GridLayout, cells: impl IntoIterator<Item = (CellCoord, TileId)>) -> Self {
        Self {
            layout,
            cells: cells.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn tile_at(&self, coord: CellCoord) -> Option<TileId> {
        self.cells.get(&coord).copied()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// Занятые ячейки в детерминированном порядке (layer → y → x)
    pub fn occupied_cells(&self) -> Vec<(CellCoord, TileId)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(coord, tile)| (*coord, *tile)).collect();
        cells.sort_by_key(|(coord, _)| coord.scan_key());
        cells
    }

    /// Поставить/очистить тайл. Возвращает `true` если содержимое изменилось.
    pub fn set_tile(&mut self, coord: CellCoord, tile: Option<TileId>) -> bool {
        let previous = match tile {
            Some(tile) => self.cells.insert(coord, tile),
            None => self.cells.remove(&coord),
        };
        if previous == tile {
            return false;
        }
        self.pending.push(CellMutation { coord, tile });
        true
    }

    pub fn pending_mutations(&self) -> usize {
        self.pending.len()
    }

    /// Опубликовать накопленные изменения одним batch'ем
    ///
    /// Возвращает размер batch'а (0 если изменений не было).
    pub fn publish_pending(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let batch = MutationBatch::new(std::mem::take(&mut self.pending));
        let size = batch.len();
        self.feed.publish(batch);
        size
    }

    pub fn feed(&self) -> &MutationFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut MutationFeed {
        &mut self.feed
    }
}

/// Сгенерировать прямоугольный грид `width x height` (layer 0) из палитры
///
/// `fill` — вероятность что ячейка занята. Детерминирован при одинаковом RNG seed.
pub fn generate_grid<R: Rng>(
    rng: &mut R,
    layout: GridLayout,
    width: i32,
    height: i32,
    palette: &[TileId],
    fill: f64,
) -> GridWorld {
    let mut cells = Vec::new();
    if palette.is_empty() {
        return GridWorld::new(layout);
    }

    for y in 0..height {
        for x in 0..width {
            if rng.gen_bool(fill.clamp(0.0, 1.0)) {
                let tile = palette[rng.gen_range(0..palette.len())];
                cells.push((CellCoord::new(x, y, 0), tile));
            }
        }
    }

    GridWorld::from_cells(layout, cells)
}

/// Система: применить `SetTileIntent` к гриду
///
/// Без `GridWorld` intent'ы выбрасываются (хост ещё не вставил/уже убрал грид).
pub fn apply_tile_intents(mut intents: EventReader<SetTileIntent>, grid: Option<ResMut<GridWorld>>) {
    let Some(mut grid) = grid else {
        let dropped = intents.read().count();
        if dropped > 0 {
            crate::logger::log_warning(&format!("⚠️ {} tile intent(s) dropped: no GridWorld", dropped));
        }
        return;
    };
    for intent in intents.read() {
        grid.set_tile(intent.coord, intent.tile);
    }
}

/// Система: опубликовать pending изменения грида подписчикам
pub fn publish_grid_mutations(grid: Option<ResMut<GridWorld>>) {
    let Some(mut grid) = grid else {
        return;
    };
    if grid.pending_mutations() == 0 {
        return;
    }
    let subscribers = grid.feed().active_subscriptions();
    let size = grid.publish_pending();
    crate::logger::log(&format!(
        "🧱 Grid mutations published: {} cells → {} subscriber(s)",
        size, subscribers
    ));
}
