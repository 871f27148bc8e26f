//! Source Patch Engine — in-place патч area classification по mutation batch
//!
//! Горячий путь: O(1) на изменённую ячейку, O(batch) всего. Масштабируется по числу
//! изменённых ячеек, а не по размеру мира — ради этого и держим `GridSourceIndex`.
//!
//! Инварианты:
//! - длина и порядок `SourceList` не меняются
//! - индекс не трогается
//! - geometry и transform записи не трогаются, пишется только `area`

use std::ops::AddAssign;

use crate::error::NavCacheError;
use crate::grid::MutationBatch;
use crate::index::GridSourceIndex;
use crate::modifier::TileModifier;
use crate::source::SourceList;

/// Итог применения batch'а (или накопленный по нескольким batch'ам)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Записи, у которых area реально изменилась
    pub patched: usize,
    /// Resolve дал ту же area, что уже стояла
    pub unchanged: usize,
    /// Координата без source (пустые/удалённые тайлы) — тихий skip
    pub unindexed: usize,
    /// Нет записи и нет override — предыдущая area сохраняется
    pub unresolved: usize,
}

impl PatchReport {
    /// Сколько mutation entries обработано всего
    pub fn processed(&self) -> usize {
        self.patched + self.unchanged + self.unindexed + self.unresolved
    }
}

impl AddAssign for PatchReport {
    fn add_assign(&mut self, other: Self) {
        self.patched += other.patched;
        self.unchanged += other.unchanged;
        self.unindexed += other.unindexed;
        self.unresolved += other.unresolved;
    }
}

/// Применить batch к source list
///
/// Entries применяются в порядке доставки: при повторе координаты выигрывает последняя.
/// Ошибка только при stale индексе (нарушение предусловия) — тогда список не трогается.
pub fn apply_mutations(
    list: &mut SourceList,
    index: &GridSourceIndex,
    modifier: &TileModifier,
    batch: &MutationBatch,
) -> Result<PatchReport, NavCacheError> {
    index.ensure_valid_for(list)?;

    let mut report = PatchReport::default();
    for mutation in &batch.mutations {
        let Some(position) = index.get(mutation.coord) else {
            report.unindexed += 1;
            continue;
        };
        let Some(area) = modifier.resolve_cell(mutation.tile) else {
            report.unresolved += 1;
            continue;
        };
        // Позиция из валидного индекса всегда в пределах списка
        let Some(source) = list.get_mut(position) else {
            report.unindexed += 1;
            continue;
        };

        if source.area == area {
            report.unchanged += 1;
        } else {
            source.area = area;
            report.patched += 1;
        }
    }

    Ok(report)
}
