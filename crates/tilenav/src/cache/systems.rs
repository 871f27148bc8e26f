//! Cache systems (Update, per-frame)

use bevy::prelude::*;

use crate::error::NavCacheError;
use crate::grid::GridWorld;
use crate::modifier::TileModifier;
use crate::rebuild::NavBuildSettings;
use crate::surface::collect_sources;

use super::{CollectNavSourcesIntent, NavSourceCache};

/// Система: полная коллекция sources + Collection Hook
///
/// Запускается на первом кадре, по `CollectNavSourcesIntent` и когда подписка кэша
/// потеряна (хост вставил новый `GridWorld`). Несколько intent'ов в одном кадре =
/// одна коллекция.
pub fn collect_nav_sources(
    mut intents: EventReader<CollectNavSourcesIntent>,
    mut cache: ResMut<NavSourceCache>,
    grid: Option<ResMut<GridWorld>>,
    modifier: Option<Res<TileModifier>>,
    settings: Res<NavBuildSettings>,
) {
    let requested = intents.read().count() > 0;
    let detached = grid
        .as_ref()
        .is_some_and(|grid| cache.has_lost_subscription(grid.feed()));
    if cache.has_collected() && !requested && !detached {
        return;
    }

    let (Some(mut grid), Some(modifier)) = (grid, modifier) else {
        crate::logger::log_warning(&format!(
            "⚠️ Source collection skipped: {}",
            NavCacheError::MissingCollaborator("GridWorld/TileModifier")
        ));
        return;
    };

    if detached {
        crate::logger::log_warning(
            "⚠️ Nav cache subscription lost (GridWorld replaced?) — re-collecting sources",
        );
    }

    let sources = collect_sources(&grid, &modifier, &settings);
    cache.on_sources_collected(sources, grid.feed_mut());
}

/// Система: применить mutation batch'и подписки кэша
///
/// Отсутствующий grid или modifier — не фатально: batch'и пропускаются с diagnostic,
/// кадр продолжается.
pub fn apply_source_patches(
    mut cache: ResMut<NavSourceCache>,
    grid: Option<ResMut<GridWorld>>,
    modifier: Option<Res<TileModifier>>,
    mut warned: Local<bool>,
) {
    if cache.subscription().is_none() {
        return;
    }

    let Some(mut grid) = grid else {
        if !*warned {
            crate::logger::log_warning(&format!(
                "⚠️ Source patches skipped: {}",
                NavCacheError::MissingCollaborator("GridWorld")
            ));
            *warned = true;
        }
        return;
    };

    let Some(modifier) = modifier else {
        let skipped = cache.discard_pending(grid.feed_mut());
        if skipped > 0 {
            crate::logger::log_warning(&format!(
                "⚠️ {} mutation batch(es) skipped: {}",
                skipped,
                NavCacheError::MissingCollaborator("TileModifier")
            ));
        }
        return;
    };
    *warned = false;

    match cache.apply_pending(grid.feed_mut(), &modifier) {
        Ok(report) if report.processed() > 0 => {
            crate::logger::log(&format!(
                "🩹 Nav sources patched: {} changed, {} unchanged, {} unindexed, {} unresolved",
                report.patched, report.unchanged, report.unindexed, report.unresolved
            ));
        }
        Ok(_) => {}
        Err(err) => {
            crate::logger::log_error(&format!("❌ Source patch failed: {}", err));
        }
    }
}
