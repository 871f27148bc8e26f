//! Nav cache integration test
//!
//! Полный headless App: SetTileIntent → grid → mutation feed → patch → rebuild.
//!
//! Проверяем:
//! - первый кадр собирает sources и строит индекс
//! - edit'ы патчат только затронутые записи
//! - повторная коллекция не дублирует подписку
//! - отсутствующий modifier/grid не роняет кадр
//! - подменённый GridWorld пересобирается, edit'ы не теряются
//! - rebuild завершается и видит патчи, даже при запросах каждый кадр

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use tilenav::modifier::{ModifierEntry, TileModifierConfig};
use tilenav::rebuild::RebuildInput;
use tilenav::*;

const TILE_A: TileId = TileId(1);
const TILE_B: TileId = TileId(2);
const WALL: TileId = TileId(6);

fn config() -> NavCacheConfig {
    NavCacheConfig {
        modifiers: TileModifierConfig {
            entries: vec![
                ModifierEntry { tile: TILE_A, area: AreaType::Road },
                ModifierEntry { tile: WALL, area: AreaType::NotWalkable },
            ],
            override_area: false,
            override_value: AreaType::Walkable,
        },
        ..Default::default()
    }
}

fn two_cell_grid() -> GridWorld {
    GridWorld::from_cells(
        GridLayout::default(),
        [(CellCoord::new(0, 0, 0), TILE_A), (CellCoord::new(1, 0, 0), TILE_B)],
    )
}

/// Helper: App с гридом (0,0)->A, (1,0)->B
fn create_nav_app() -> App {
    let mut app = create_headless_app(42);
    app.insert_resource(two_cell_grid())
        .add_plugins(TileNavPlugin::new(config()));
    app
}

fn areas(app: &App) -> Vec<AreaType> {
    app.world()
        .resource::<NavSourceCache>()
        .sources()
        .iter()
        .map(|source| source.area)
        .collect()
}

fn set_tile(app: &mut App, x: i32, y: i32, tile: Option<TileId>) {
    app.world_mut().send_event(SetTileIntent {
        coord: CellCoord::new(x, y, 0),
        tile,
    });
}

fn run_until_rebuilt(app: &mut App) {
    app.update();
    for _ in 0..5000 {
        if !app.world().resource::<NavRebuildState>().is_rebuilding() {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
        app.update();
    }
    panic!("rebuild did not finish in time");
}

#[test]
fn test_first_frame_collects_sources() {
    let mut app = create_nav_app();
    app.update();

    let cache = app.world().resource::<NavSourceCache>();
    assert_eq!(cache.sources().len(), 2);
    assert_eq!(cache.index().map(GridSourceIndex::len), Some(2));
    assert_eq!(cache.stats().collections, 1);
    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::Walkable]);
}

#[test]
fn test_scenario_edit_patches_in_place() {
    let mut app = create_nav_app();
    app.update();
    let index_before = app.world().resource::<NavSourceCache>().index().cloned();

    set_tile(&mut app, 1, 0, Some(TILE_A));
    app.update();

    let cache = app.world().resource::<NavSourceCache>();
    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::Road]);
    assert_eq!(cache.index().cloned(), index_before);
    assert_eq!(cache.stats().collections, 1); // Патч, а не пересборка
    assert_eq!(cache.stats().patches.patched, 1);
}

#[test]
fn test_edit_of_empty_cell_is_ignored_until_recollect() {
    let mut app = create_nav_app();
    app.update();

    set_tile(&mut app, 5, 5, Some(TILE_A));
    app.update();

    assert_eq!(app.world().resource::<NavSourceCache>().sources().len(), 2);
    assert_eq!(app.world().resource::<NavSourceCache>().stats().patches.unindexed, 1);

    // Новая ячейка появляется только после полной коллекции
    app.world_mut().send_event(CollectNavSourcesIntent);
    app.update();

    let cache = app.world().resource::<NavSourceCache>();
    assert_eq!(cache.sources().len(), 3);
    assert!(cache.index().is_some_and(|index| index.contains(CellCoord::new(5, 5, 0))));
}

#[test]
fn test_repeated_collection_keeps_single_subscription() {
    let mut app = create_nav_app();
    app.update();

    app.world_mut().send_event(CollectNavSourcesIntent);
    app.update();
    app.world_mut().send_event(CollectNavSourcesIntent);
    app.update();

    assert_eq!(app.world().resource::<GridWorld>().feed().active_subscriptions(), 1);

    set_tile(&mut app, 1, 0, Some(TILE_A));
    app.update();

    let stats = app.world().resource::<NavSourceCache>().stats();
    assert_eq!(stats.collections, 3);
    assert_eq!(stats.batches_applied, 1);
    assert_eq!(stats.patches.processed(), 1);
}

#[test]
fn test_missing_modifier_skips_batch_without_crash() {
    let mut app = create_nav_app();
    app.update();

    app.world_mut().remove_resource::<TileModifier>();
    set_tile(&mut app, 1, 0, Some(TILE_A));
    app.update();

    // Batch пропущен, список не тронут, очередь подписки пуста
    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::Walkable]);
    let subscription = app.world().resource::<NavSourceCache>().subscription().unwrap();
    assert_eq!(app.world().resource::<GridWorld>().feed().pending_batches(subscription), 0);

    // Modifier вернулся — следующие edit'ы снова патчатся
    app.insert_resource(TileModifier::new().with_area(TILE_A, AreaType::Road));
    set_tile(&mut app, 0, 0, Some(TILE_B));
    set_tile(&mut app, 0, 0, Some(TILE_A));
    set_tile(&mut app, 1, 0, Some(TILE_B));
    set_tile(&mut app, 1, 0, Some(TILE_A));
    app.update();

    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::Road]);
}

#[test]
fn test_rebuild_sees_patched_sources() {
    let mut app = create_nav_app();
    app.update();

    set_tile(&mut app, 1, 0, Some(WALL));
    app.world_mut().send_event(RequestNavRebuild::everywhere());
    run_until_rebuilt(&mut app);

    let state = app.world().resource::<NavRebuildState>();
    let surface = state.surface().expect("surface after rebuild");
    assert_eq!(state.completed, 1);
    assert!(surface.is_walkable(CellCoord::new(0, 0, 0)));
    assert!(!surface.is_walkable(CellCoord::new(1, 0, 0)));
    assert_eq!(surface.blocked, 1);
}

#[test]
fn test_rebuild_requests_in_one_frame_are_coalesced() {
    let mut app = create_nav_app();
    app.update();

    let left = BakeBounds::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
    let right = BakeBounds::new(Vec3::new(1.0, -1.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
    app.world_mut().send_event(RequestNavRebuild::within(left));
    app.world_mut().send_event(RequestNavRebuild::within(right));
    run_until_rebuilt(&mut app);

    let state = app.world().resource::<NavRebuildState>();
    assert_eq!(state.completed, 1);
    assert_eq!(state.cancelled, 0);
    let surface = state.surface().expect("surface after rebuild");
    assert_eq!(surface.bounds, Some(left.union(&right)));
    assert_eq!(surface.walkable.len(), 2);
}

#[test]
fn test_replaced_grid_is_recollected_and_edits_survive() {
    let mut app = create_nav_app();
    app.update();

    // Хост подменяет GridWorld целиком (перезагрузка уровня)
    app.insert_resource(two_cell_grid());
    set_tile(&mut app, 1, 0, Some(WALL));
    app.update();

    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::NotWalkable]);
    let cache = app.world().resource::<NavSourceCache>();
    let grid = app.world().resource::<GridWorld>();
    assert!(cache.is_attached_to(grid.feed()));
    assert_eq!(grid.feed().active_subscriptions(), 1);
    assert_eq!(cache.stats().collections, 2);

    // Дальше — обычный patch path на новом feed'е
    set_tile(&mut app, 0, 0, Some(WALL));
    app.update();

    let cache = app.world().resource::<NavSourceCache>();
    assert_eq!(areas(&app), vec![AreaType::NotWalkable, AreaType::NotWalkable]);
    assert_eq!(cache.stats().collections, 2);
    assert_eq!(cache.stats().batches_applied, 1);
}

#[test]
fn test_missing_grid_before_first_collection() {
    let mut app = create_nav_app();
    app.world_mut().remove_resource::<GridWorld>();

    set_tile(&mut app, 0, 0, Some(WALL));
    app.world_mut().send_event(RequestNavRebuild::everywhere());
    app.update();
    app.update();

    // Кадры проходят, коллекции и rebuild'а нет
    let cache = app.world().resource::<NavSourceCache>();
    assert!(!cache.has_collected());
    assert!(cache.subscription().is_none());
    assert!(!app.world().resource::<NavRebuildState>().is_rebuilding());

    // Grid появился — первая коллекция на следующем кадре
    app.insert_resource(two_cell_grid());
    app.update();

    let cache = app.world().resource::<NavSourceCache>();
    assert!(cache.has_collected());
    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::Walkable]);
}

#[test]
fn test_missing_grid_after_collection_skips_frames() {
    let mut app = create_nav_app();
    app.update();

    app.world_mut().remove_resource::<GridWorld>();
    set_tile(&mut app, 1, 0, Some(WALL));
    app.update();
    app.update();

    // Список не тронут, edit без грида выброшен
    let cache = app.world().resource::<NavSourceCache>();
    assert_eq!(areas(&app), vec![AreaType::Road, AreaType::Walkable]);
    assert_eq!(cache.stats().collections, 1);
    assert_eq!(cache.stats().batches_applied, 0);

    // Вернули grid — подписка чужая, поэтому полная коллекция
    app.insert_resource(two_cell_grid());
    app.update();

    let cache = app.world().resource::<NavSourceCache>();
    assert_eq!(cache.stats().collections, 2);
    assert!(cache.is_attached_to(app.world().resource::<GridWorld>().feed()));
}

/// Медленный builder: rebuild дольше кадра
struct SlowBuilder;

impl NavBuildService for SlowBuilder {
    fn build(&self, input: &RebuildInput, bounds: BakeBounds, settings: &NavBuildSettings) -> NavSurface {
        std::thread::sleep(Duration::from_millis(20));
        CostFieldBuilder.build(input, bounds, settings)
    }
}

#[test]
fn test_rebuild_requested_every_frame_still_completes() {
    let mut app = create_headless_app(42);
    app.insert_resource(two_cell_grid())
        .add_plugins(TileNavPlugin::new(config()).with_service(Arc::new(SlowBuilder)));
    app.update();

    for frame in 0..60 {
        if frame == 30 {
            set_tile(&mut app, 1, 0, Some(WALL));
        }
        app.world_mut().send_event(RequestNavRebuild::everywhere());
        std::thread::sleep(Duration::from_millis(5));
        app.update();
    }

    let state = app.world().resource::<NavRebuildState>();
    assert!(state.completed > 0, "continuous requests starved the rebuild");
    assert_eq!(state.cancelled, 0);
    assert!(state.deferred > 0);

    // Последний отложенный запрос видит стену, поставленную посреди серии
    run_until_rebuilt(&mut app);
    let state = app.world().resource::<NavRebuildState>();
    let surface = state.surface().expect("surface after rebuild");
    assert!(surface.is_walkable(CellCoord::new(0, 0, 0)));
    assert!(!surface.is_walkable(CellCoord::new(1, 0, 0)));
}
