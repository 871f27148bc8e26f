//! Rebuild domain — асинхронный rebuild derived nav structure
//!
//! # Flow
//! 1. Gameplay/UI пишет `RequestNavRebuild { bounds }` (после серии edit'ов)
//! 2. `dispatch_rebuild_requests` склеивает запросы кадра в один (union bounds) и
//!    отправляет в `AsyncComputeTaskPool`. Если rebuild уже идёт — запрос ставится
//!    в очередь (одна запись, bounds накапливаются union'ом)
//! 3. `poll_rebuild_tasks` раз в кадр проверяет handle без блокировки
//! 4. По завершении: `NavRebuildState::surface()` обновлён + `NavSurfaceRebuilt` event,
//!    отложенный запрос уходит в пул по текущему source list
//!
//! # Submodules
//! - `settings`: BakeBounds, NavBuildSettings (opaque для core)
//! - `service`: NavBuildService trait + reference CostFieldBuilder
//! - `handle`: RebuildHandle + request_rebuild

use std::sync::Arc;

use bevy::prelude::*;

pub mod handle;
pub mod service;
pub mod settings;

pub use handle::{request_rebuild, RebuildHandle};
pub use service::{CostFieldBuilder, NavBuildService, NavSurface, RebuildInput};
pub use settings::{BakeBounds, NavBuildSettings};

use crate::cache::NavSourceCache;

/// Запрос rebuild. `bounds: None` = `NavBuildSettings::bake_bounds`
#[derive(Event, Debug, Clone)]
pub struct RequestNavRebuild {
    pub bounds: Option<BakeBounds>,
}

impl RequestNavRebuild {
    pub fn everywhere() -> Self {
        Self { bounds: None }
    }

    pub fn within(bounds: BakeBounds) -> Self {
        Self {
            bounds: Some(bounds),
        }
    }
}

/// Rebuild завершён, `NavRebuildState::surface()` содержит результат
#[derive(Event, Debug, Clone)]
pub struct NavSurfaceRebuilt {
    pub request_id: u64,
    pub bounds: BakeBounds,
    pub source_generation: u64,
    pub walkable_cells: usize,
    pub blocked_cells: usize,
}

/// Запрос, пришедший пока предыдущий rebuild ещё в работе
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedRebuild {
    pub id: u64,
    pub bounds: BakeBounds,
}

/// Rebuild trigger state: сервис + in-flight handle + отложенный запрос + последний результат
#[derive(Resource)]
pub struct NavRebuildState {
    service: Arc<dyn NavBuildService>,
    in_flight: Option<RebuildHandle>,
    queued: Option<QueuedRebuild>,
    surface: Option<NavSurface>,
    next_request_id: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Запросов, ушедших в очередь за in-flight rebuild'ом
    pub deferred: u64,
}

impl NavRebuildState {
    pub fn new(service: Arc<dyn NavBuildService>) -> Self {
        Self {
            service,
            in_flight: None,
            queued: None,
            surface: None,
            next_request_id: 1,
            completed: 0,
            cancelled: 0,
            deferred: 0,
        }
    }

    /// Запросить rebuild по текущему (пропатченному) source list
    ///
    /// Свободно — задача сразу уходит в пул. Занято — запрос копится в очереди
    /// (union bounds с уже отложенным) и стартует после завершения текущего.
    /// Возвращает id, под которым придёт `NavSurfaceRebuilt`.
    pub fn request_rebuild(
        &mut self,
        cache: &NavSourceCache,
        bounds: BakeBounds,
        settings: &NavBuildSettings,
    ) -> u64 {
        if self.in_flight.is_none() {
            let id = self.allocate_id();
            self.start(cache, id, bounds, settings);
            return id;
        }

        self.deferred += 1;
        let queued = match self.queued {
            Some(queued) => QueuedRebuild {
                id: queued.id,
                bounds: queued.bounds.union(&bounds),
            },
            None => QueuedRebuild {
                id: self.allocate_id(),
                bounds,
            },
        };
        self.queued = Some(queued);
        queued.id
    }

    /// Запустить отложенный запрос, если пул свободен
    pub fn dispatch_queued(&mut self, cache: &NavSourceCache, settings: &NavBuildSettings) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        let queued = self.queued.take()?;
        self.start(cache, queued.id, queued.bounds, settings);
        Some(queued.id)
    }

    /// Отменить in-flight rebuild (drop задачи). Отложенный запрос остаётся.
    pub fn cancel_in_flight(&mut self) -> bool {
        let Some(handle) = self.in_flight.take() else {
            return false;
        };
        crate::logger::log(&format!("🚫 NavRebuild #{} cancelled", handle.id()));
        handle.cancel();
        self.cancelled += 1;
        true
    }

    /// Неблокирующий poll in-flight rebuild'а
    pub fn poll(&mut self) -> Option<NavSurfaceRebuilt> {
        let handle = self.in_flight.as_mut()?;
        let surface = handle.poll()?;
        let request_id = handle.id();
        let bounds = handle.bounds();
        self.in_flight = None;
        self.completed += 1;

        let event = NavSurfaceRebuilt {
            request_id,
            bounds,
            source_generation: surface.source_generation,
            walkable_cells: surface.walkable.len(),
            blocked_cells: surface.blocked,
        };
        self.surface = Some(surface);
        Some(event)
    }

    pub fn in_flight(&self) -> Option<&RebuildHandle> {
        self.in_flight.as_ref()
    }

    pub fn queued(&self) -> Option<&QueuedRebuild> {
        self.queued.as_ref()
    }

    /// Есть работа: задача в пуле или отложенный запрос
    pub fn is_rebuilding(&self) -> bool {
        self.in_flight.is_some() || self.queued.is_some()
    }

    /// Последняя завершённая derived structure
    pub fn surface(&self) -> Option<&NavSurface> {
        self.surface.as_ref()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn start(&mut self, cache: &NavSourceCache, id: u64, bounds: BakeBounds, settings: &NavBuildSettings) {
        let handle = request_rebuild(self.service.clone(), cache.sources(), bounds, settings, id);
        crate::logger::log(&format!(
            "🔁 NavRebuild #{} dispatched: {} sources, bounds {:?}..{:?}",
            id,
            cache.sources().len(),
            bounds.min(),
            bounds.max()
        ));
        self.in_flight = Some(handle);
    }
}

impl Default for NavRebuildState {
    fn default() -> Self {
        Self::new(Arc::new(CostFieldBuilder))
    }
}

/// Система: склеить запросы кадра и отправить один rebuild
pub fn dispatch_rebuild_requests(
    mut requests: EventReader<RequestNavRebuild>,
    mut state: ResMut<NavRebuildState>,
    cache: Res<NavSourceCache>,
    settings: Res<NavBuildSettings>,
) {
    let mut merged: Option<BakeBounds> = None;
    for request in requests.read() {
        let bounds = request.bounds.unwrap_or(settings.bake_bounds);
        merged = Some(match merged {
            Some(current) => current.union(&bounds),
            None => bounds,
        });
    }

    let Some(bounds) = merged else {
        return;
    };
    if !cache.has_collected() {
        crate::logger::log_warning("⚠️ NavRebuild requested before first source collection — skipped");
        return;
    }

    let id = state.request_rebuild(&cache, bounds, &settings);
    if let Some(queued) = state.queued().filter(|queued| queued.id == id) {
        crate::logger::log(&format!(
            "⏳ NavRebuild #{} queued behind in-flight rebuild, bounds {:?}..{:?}",
            id,
            queued.bounds.min(),
            queued.bounds.max()
        ));
    }
}

/// Система: poll in-flight rebuild (никогда не блокирует кадр)
///
/// Завершённый rebuild освобождает пул — отложенный запрос стартует в том же кадре.
pub fn poll_rebuild_tasks(
    mut state: ResMut<NavRebuildState>,
    cache: Res<NavSourceCache>,
    settings: Res<NavBuildSettings>,
    mut rebuilt: EventWriter<NavSurfaceRebuilt>,
) {
    if let Some(event) = state.poll() {
        crate::logger::log_info(&format!(
            "✅ NavRebuild #{} done: {} walkable, {} blocked",
            event.request_id, event.walkable_cells, event.blocked_cells
        ));
        rebuilt.write(event);
    }
    state.dispatch_queued(&cache, &settings);
}
