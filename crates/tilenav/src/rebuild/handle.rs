//! Rebuild handle — фоновая задача rebuild в `AsyncComputeTaskPool`
//!
//! Handle не блокирует: `poll()` раз в кадр. Drop handle = отмена задачи
//! (что успел сделать сам сервис — его дело).

use std::sync::Arc;

use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task, TaskPool};

use crate::source::SourceList;

use super::service::{NavBuildService, NavSurface, RebuildInput};
use super::settings::{BakeBounds, NavBuildSettings};

pub struct RebuildHandle {
    id: u64,
    bounds: BakeBounds,
    source_generation: u64,
    task: Option<Task<NavSurface>>,
}

impl RebuildHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bounds(&self) -> BakeBounds {
        self.bounds
    }

    pub fn source_generation(&self) -> u64 {
        self.source_generation
    }

    /// Задача завершена (результат ещё можно забрать через `poll`)
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(Task::is_finished).unwrap_or(true)
    }

    /// Неблокирующая проверка. `Some` возвращается ровно один раз.
    pub fn poll(&mut self) -> Option<NavSurface> {
        let task = self.task.as_mut()?;
        let surface = block_on(future::poll_once(task))?;
        self.task = None;
        Some(surface)
    }

    /// Явная отмена (эквивалент drop)
    pub fn cancel(self) {}
}

impl std::fmt::Debug for RebuildHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildHandle")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("source_generation", &self.source_generation)
            .field("pending", &self.task.is_some())
            .finish()
    }
}

/// Запросить rebuild derived structure внутри `bounds`
///
/// Source list копируется в snapshot (уже со всеми применёнными патчами), задача
/// уходит в пул. Вызывающий не блокируется.
pub fn request_rebuild(
    service: Arc<dyn NavBuildService>,
    list: &SourceList,
    bounds: BakeBounds,
    settings: &NavBuildSettings,
    id: u64,
) -> RebuildHandle {
    let input = RebuildInput::snapshot(list);
    let settings = settings.clone();
    let source_generation = input.generation;

    let pool = AsyncComputeTaskPool::get_or_init(TaskPool::default);
    let task = pool.spawn(async move { service.build(&input, bounds, &settings) });

    RebuildHandle {
        id,
        bounds,
        source_generation,
        task: Some(task),
    }
}
