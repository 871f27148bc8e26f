//! Nav source cache — source list + grid source index + mutation subscription
//!
//! # Architecture
//!
//! **Collection Hook** (`on_sources_collected`, раз на полную коллекцию):
//! - принимает свежий `SourceList`
//! - строит `GridSourceIndex`, если валидного индекса нет (generation не совпадает)
//! - re-arm подписки: unsubscribe старой → subscribe новой (ровно одна активная)
//!
//! **Patch path** (`apply_pending` / `on_mutation`, между коллекциями):
//! - mutation batch → `TileModifier::resolve_cell` → in-place патч area
//! - длина/порядок списка и индекс не меняются
//!
//! Source list и индекс живут в одном resource: обновляются только вместе, один writer.

use bevy::prelude::*;

pub mod systems;

pub use systems::*;

use crate::error::NavCacheError;
use crate::grid::{GridLayout, MutationBatch, MutationFeed, SubscriptionId};
use crate::index::GridSourceIndex;
use crate::modifier::TileModifier;
use crate::patch::{apply_mutations, PatchReport};
use crate::source::SourceList;

/// Intent: выполнить полную коллекцию sources (например после загрузки уровня)
#[derive(Event, Debug, Clone, Default)]
pub struct CollectNavSourcesIntent;

/// Счётчики кэша (diagnostics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavCacheStats {
    pub collections: u64,
    pub index_builds: u64,
    pub batches_applied: u64,
    pub patches: PatchReport,
}

#[derive(Resource, Debug)]
pub struct NavSourceCache {
    sources: SourceList,
    index: Option<GridSourceIndex>,
    subscription: Option<SubscriptionId>,
    stats: NavCacheStats,
}

impl NavSourceCache {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            sources: SourceList::empty(layout),
            index: None,
            subscription: None,
            stats: NavCacheStats::default(),
        }
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    pub fn index(&self) -> Option<&GridSourceIndex> {
        self.index.as_ref()
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn stats(&self) -> NavCacheStats {
        self.stats
    }

    pub fn has_collected(&self) -> bool {
        self.stats.collections > 0
    }

    /// Collection Hook: принять свежий source list от owning builder'а
    pub fn on_sources_collected(&mut self, sources: SourceList, feed: &mut MutationFeed) {
        self.sources = sources;
        self.stats.collections += 1;
        self.ensure_index();

        // Re-arm: старая подписка снимается всегда, даже если уже отписана снаружи
        if let Some(previous) = self.subscription.take() {
            feed.unsubscribe(previous);
        }
        self.subscription = Some(feed.subscribe());

        crate::logger::log(&format!(
            "📦 Nav sources collected: {} sources (generation {}), {} indexed cells",
            self.sources.len(),
            self.sources.generation(),
            self.index.as_ref().map(GridSourceIndex::len).unwrap_or(0)
        ));
    }

    /// Сбросить индекс явно — пересоберётся при следующем использовании
    pub fn invalidate_index(&mut self) {
        self.index = None;
    }

    /// Подписка кэша активна именно на этом feed'е
    pub fn is_attached_to(&self, feed: &MutationFeed) -> bool {
        self.subscription.is_some_and(|id| feed.is_subscribed(id))
    }

    /// Подписка есть, но feed её не знает (grid подменён целиком) — batch'и теряются
    pub fn has_lost_subscription(&self, feed: &MutationFeed) -> bool {
        self.subscription.is_some() && !self.is_attached_to(feed)
    }

    /// Снять подписку (кэш больше не получает мутации до следующей коллекции)
    pub fn detach(&mut self, feed: &mut MutationFeed) {
        if let Some(previous) = self.subscription.take() {
            feed.unsubscribe(previous);
        }
    }

    /// Source Patch Engine: применить один batch
    pub fn on_mutation(
        &mut self,
        batch: &MutationBatch,
        modifier: &TileModifier,
    ) -> Result<PatchReport, NavCacheError> {
        if !self.has_collected() {
            return Err(NavCacheError::NotCollected);
        }
        self.ensure_index();
        let Some(index) = self.index.as_ref() else {
            return Err(NavCacheError::NotCollected);
        };

        let report = apply_mutations(&mut self.sources, index, modifier, batch)?;
        self.stats.batches_applied += 1;
        self.stats.patches += report;
        Ok(report)
    }

    /// Забрать все batch'и своей подписки и применить в порядке публикации
    pub fn apply_pending(
        &mut self,
        feed: &mut MutationFeed,
        modifier: &TileModifier,
    ) -> Result<PatchReport, NavCacheError> {
        let subscription = self.subscription.ok_or(NavCacheError::NotCollected)?;

        let mut total = PatchReport::default();
        for batch in feed.drain(subscription) {
            total += self.on_mutation(&batch, modifier)?;
        }
        Ok(total)
    }

    /// Выбросить недоставленные batch'и (skip при отсутствии коллаборатора)
    pub fn discard_pending(&mut self, feed: &mut MutationFeed) -> usize {
        self.subscription
            .map(|subscription| feed.drain(subscription).len())
            .unwrap_or(0)
    }

    // Индекс строится лениво: нет индекса или он описывает другой список
    fn ensure_index(&mut self) {
        let valid = self
            .index
            .as_ref()
            .is_some_and(|index| index.is_valid_for(&self.sources));
        if valid {
            return;
        }

        let index = GridSourceIndex::build(&self.sources);
        self.stats.index_builds += 1;
        crate::logger::log(&format!(
            "🗂️ Grid source index rebuilt: {} cells, generation {}",
            index.len(),
            index.generation()
        ));
        self.index = Some(index);
    }
}
