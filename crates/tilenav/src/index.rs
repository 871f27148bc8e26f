//! Grid Source Index: CellCoord → позиция в `SourceList`
//!
//! Вторичный индекс поверх arena. Строится одним проходом по списку и никогда не
//! патчится инкрементально: после пересборки списка позиции не стабильны, поэтому
//! индекс хранит generation списка, из которого построен.

use std::collections::HashMap;

use crate::error::NavCacheError;
use crate::grid::CellCoord;
use crate::source::SourceList;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSourceIndex {
    generation: u64,
    positions: HashMap<CellCoord, usize>,
    duplicates: usize,
}

impl GridSourceIndex {
    /// Построить индекс из source list. O(n).
    ///
    /// Координата каждой записи выводится из её transform. Дубликаты координат для
    /// корректного грида не ожидаются; если встретились — выигрывает последняя позиция.
    pub fn build(list: &SourceList) -> Self {
        let mut positions = HashMap::with_capacity(list.len());
        let mut duplicates = 0;

        for position in 0..list.len() {
            let Some(coord) = list.origin_cell(position) else {
                continue;
            };
            if let Some(previous) = positions.insert(coord, position) {
                duplicates += 1;
                crate::logger::log_warning(&format!(
                    "⚠️ Duplicate source for cell {:?}: position {} replaces {}",
                    coord, position, previous
                ));
            }
        }

        Self {
            generation: list.generation(),
            positions,
            duplicates,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, coord: CellCoord) -> Option<usize> {
        self.positions.get(&coord).copied()
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.positions.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Сколько дубликатов координат встретилось при build
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, usize)> + '_ {
        self.positions.iter().map(|(coord, position)| (*coord, *position))
    }

    pub fn is_valid_for(&self, list: &SourceList) -> bool {
        self.generation == list.generation()
    }

    /// Проверка предусловия перед использованием индекса со списком
    pub fn ensure_valid_for(&self, list: &SourceList) -> Result<(), NavCacheError> {
        if self.is_valid_for(list) {
            Ok(())
        } else {
            Err(NavCacheError::StaleIndex {
                index: self.generation,
                list: list.generation(),
            })
        }
    }
}
