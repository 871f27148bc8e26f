//! TILENAV — incremental build-source cache для navigation над тайловым миром
//!
//! ECS-интеграция на Bevy 0.16 (headless, без рендера).
//!
//! ARCHITECTURE:
//! - Grid = мутабельный тайловый мир, публикует mutation batch'и подписчикам
//! - Cache = flat source list + grid source index (CellCoord → позиция)
//! - Patch engine = in-place патч area по batch'у, O(изменённых ячеек)
//! - Rebuild = асинхронный rebuild derived nav structure внешним сервисом
//!
//! Порядок систем за кадр (Update, `.chain()`):
//! 1. apply_tile_intents — SetTileIntent → GridWorld
//! 2. publish_grid_mutations — pending → MutationBatch → подписчики
//! 3. collect_nav_sources — полная коллекция (первый кадр / CollectNavSourcesIntent)
//! 4. apply_source_patches — batch'и подписки кэша → in-place патч
//! 5. dispatch_rebuild_requests — RequestNavRebuild → AsyncComputeTaskPool
//! 6. poll_rebuild_tasks — неблокирующий poll → NavSurfaceRebuilt

use std::sync::Arc;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod index;
pub mod logger;
pub mod modifier;
pub mod patch;
pub mod rebuild;
pub mod source;
pub mod surface;


// Re-export основных типов
pub use cache::{CollectNavSourcesIntent, NavCacheStats, NavSourceCache};
pub use config::NavCacheConfig;
pub use error::{NavCacheError, NavConfigError};
pub use grid::{
    CellCoord, CellMutation, GridLayout, GridWorld, MutationBatch, MutationFeed, SetTileIntent,
    SubscriptionId, TileId,
};
pub use index::GridSourceIndex;
pub use modifier::{AreaType, TileModifier};
pub use patch::{apply_mutations, PatchReport};
pub use rebuild::{
    BakeBounds, CostFieldBuilder, NavBuildService, NavBuildSettings, NavRebuildState, NavSurface,
    NavSurfaceRebuilt, QueuedRebuild, RebuildHandle, RequestNavRebuild,
};
pub use source::{source_snapshot, BuildSource, GeometryRef, SourceList};
pub use surface::collect_sources;

/// Главный plugin nav cache (ресурсы + события + системы)
///
/// Если `GridWorld` уже вставлен до plugin'а — используется он (layout из конфига
/// тогда игнорируется).
pub struct TileNavPlugin {
    pub config: NavCacheConfig,
    pub service: Arc<dyn NavBuildService>,
}

impl Default for TileNavPlugin {
    fn default() -> Self {
        Self::new(NavCacheConfig::builtin())
    }
}

impl TileNavPlugin {
    pub fn new(config: NavCacheConfig) -> Self {
        Self {
            config,
            service: Arc::new(CostFieldBuilder),
        }
    }

    pub fn with_service(mut self, service: Arc<dyn NavBuildService>) -> Self {
        self.service = service;
        self
    }
}

impl Plugin for TileNavPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<GridWorld>() {
            let layout = match self.config.validate() {
                Ok(()) => self.config.layout,
                Err(err) => {
                    logger::log_error(&format!("❌ {} — using default grid layout", err));
                    GridLayout::default()
                }
            };
            app.insert_resource(GridWorld::new(layout));
        }
        let layout = app.world().resource::<GridWorld>().layout;

        app.insert_resource(TileModifier::from_config(&self.config.modifiers))
            .insert_resource(self.config.build.clone())
            .insert_resource(NavSourceCache::new(layout))
            .insert_resource(NavRebuildState::new(self.service.clone()));

        // Регистрация событий
        app.add_event::<SetTileIntent>()
            .add_event::<CollectNavSourcesIntent>()
            .add_event::<RequestNavRebuild>()
            .add_event::<NavSurfaceRebuilt>();

        app.add_systems(
            Update,
            (
                grid::apply_tile_intents,
                grid::publish_grid_mutations,
                cache::collect_nav_sources,
                cache::apply_source_patches,
                rebuild::dispatch_rebuild_requests,
                rebuild::poll_rebuild_tasks,
            )
                .chain(), // Патчи должны попасть в snapshot rebuild'а того же кадра
        );
    }
}

/// Детерминистичный RNG resource (seeded) — генерация гридов и случайных edit'ов
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless запуска
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed));

    app
}
