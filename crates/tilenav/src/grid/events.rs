//! Grid events и mutation batches
//!
//! # Flow
//! 1. Gameplay/UI пишет `SetTileIntent` (build/destroy тайла)
//! 2. `apply_tile_intents` меняет `GridWorld` и копит pending mutations
//! 3. `publish_grid_mutations` отправляет один `MutationBatch` в `MutationFeed`

use bevy::prelude::*;

use super::coord::{CellCoord, TileId};

/// Intent: поставить тайл в ячейку (`Some`) или очистить её (`None`)
#[derive(Event, Debug, Clone)]
pub struct SetTileIntent {
    pub coord: CellCoord,
    pub tile: Option<TileId>,
}

/// Одно изменение содержимого ячейки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMutation {
    pub coord: CellCoord,
    /// Новый тайл; `None` = ячейка очищена
    pub tile: Option<TileId>,
}

impl CellMutation {
    pub fn set(coord: CellCoord, tile: TileId) -> Self {
        Self {
            coord,
            tile: Some(tile),
        }
    }

    pub fn clear(coord: CellCoord) -> Self {
        Self { coord, tile: None }
    }
}

/// Batch изменений с момента предыдущей публикации
///
/// Порядок внутри batch = порядок доставки (последняя запись по координате выигрывает).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub mutations: Vec<CellMutation>,
}

impl MutationBatch {
    pub fn new(mutations: Vec<CellMutation>) -> Self {
        Self { mutations }
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl FromIterator<CellMutation> for MutationBatch {
    fn from_iter<I: IntoIterator<Item = CellMutation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
