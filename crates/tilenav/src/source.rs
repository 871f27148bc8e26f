//! Build sources и flat source list (arena для nav builder'а)

use std::sync::atomic::{AtomicU64, Ordering};

use bevy::prelude::*;

use crate::grid::{CellCoord, GridLayout, TileId};
use crate::modifier::AreaType;

// Генерации уникальны на весь процесс: два разных списка никогда не совпадут по тегу
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Ссылка на геометрию, которую вносит ячейка (mesh тайла в палитре хоста)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryRef(pub u32);

impl GeometryRef {
    /// Геометрия тайла: один mesh на тип тайла
    pub fn for_tile(tile: TileId) -> Self {
        Self(tile.0)
    }
}

/// Одна единица геометрии для nav builder'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildSource {
    pub geometry: GeometryRef,
    pub transform: Transform,
    pub area: AreaType,
}

impl BuildSource {
    /// Ячейка, из которой происходит геометрия (по translation)
    pub fn origin_cell(&self, layout: &GridLayout) -> CellCoord {
        layout.cell_at(self.transform.translation)
    }
}

/// Flat source list с generation tag
///
/// Позиции стабильны до следующей полной коллекции. Длину и порядок меняет только
/// пересборка — patch engine пишет in place через `get_mut`.
#[derive(Debug, Clone)]
pub struct SourceList {
    generation: u64,
    layout: GridLayout,
    sources: Vec<BuildSource>,
}

impl SourceList {
    pub fn new(layout: GridLayout, sources: Vec<BuildSource>) -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            layout,
            sources,
        }
    }

    pub fn empty(layout: GridLayout) -> Self {
        Self::new(layout, Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&BuildSource> {
        self.sources.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut BuildSource> {
        self.sources.get_mut(position)
    }

    pub fn as_slice(&self) -> &[BuildSource] {
        &self.sources
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildSource> {
        self.sources.iter()
    }

    /// Ячейка-источник для позиции
    pub fn origin_cell(&self, position: usize) -> Option<CellCoord> {
        self.get(position).map(|source| source.origin_cell(&self.layout))
    }
}

/// Snapshot source list в байты (для сравнения детерминизма)
///
/// Generation не входит: два одинаково собранных списка дают одинаковый snapshot.
pub fn source_snapshot(list: &SourceList) -> Vec<u8> {
    let mut snapshot = Vec::with_capacity(list.len() * 24);
    for source in list.iter() {
        snapshot.extend_from_slice(&source.geometry.0.to_le_bytes());
        for value in source.transform.translation.to_array() {
            snapshot.extend_from_slice(&value.to_le_bytes());
        }
        snapshot.extend_from_slice(format!("{:?}", source.area).as_bytes());
    }
    snapshot
}
