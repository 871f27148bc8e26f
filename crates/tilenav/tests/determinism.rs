//! Тесты детерминизма nav cache
//!
//! Одинаковый seed + одинаковые edit'ы → идентичный source list.
//! Инкрементальные патчи должны давать тот же результат, что полная пересборка.

use bevy::prelude::*;
use rand::Rng;
use tilenav::grid::generate_grid;
use tilenav::*;

const GRID_SIZE: i32 = 32;
const PALETTE: [TileId; 6] = [TileId(1), TileId(2), TileId(3), TileId(4), TileId(5), TileId(6)];

/// Запускает seeded edit'ы и возвращает итоговый source list
fn run_edits(seed: u64, frames: usize, recollect_every_frame: bool) -> SourceList {
    let mut app = create_headless_app(seed);
    let grid = {
        let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
        generate_grid(&mut rng.rng, GridLayout::default(), GRID_SIZE, GRID_SIZE, &PALETTE, 1.0)
    };
    app.insert_resource(grid).add_plugins(TileNavPlugin::default());
    app.update();

    for _ in 0..frames {
        // Только замены тайлов (без очистки) — набор занятых ячеек стабилен
        let edits: Vec<SetTileIntent> = {
            let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
            (0..16)
                .map(|_| SetTileIntent {
                    coord: CellCoord::new(rng.rng.gen_range(0..GRID_SIZE), rng.rng.gen_range(0..GRID_SIZE), 0),
                    tile: Some(PALETTE[rng.rng.gen_range(0..PALETTE.len())]),
                })
                .collect()
        };
        for edit in edits {
            app.world_mut().send_event(edit);
        }
        if recollect_every_frame {
            app.world_mut().send_event(CollectNavSourcesIntent);
        }
        app.update();
    }

    app.world().resource::<NavSourceCache>().sources().clone()
}

/// Area + позиция каждой записи (geometry патч не трогает, поэтому её не сравниваем)
fn placed_areas(list: &SourceList) -> Vec<(Vec3, AreaType)> {
    list.iter().map(|source| (source.transform.translation, source.area)).collect()
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;

    let snapshot1 = source_snapshot(&run_edits(SEED, 100, false));
    let snapshot2 = source_snapshot(&run_edits(SEED, 100, false));

    assert_eq!(
        snapshot1, snapshot2,
        "Nav cache с одинаковым seed ({}) дал разные source list'ы!",
        SEED
    );
}

#[test]
fn test_incremental_patches_match_full_recollection() {
    const SEED: u64 = 42;

    // Builtin modifiers покрывают всю палитру → каждый патч resolve'ится,
    // поэтому патченный список совпадает с пересобранным
    let patched = run_edits(SEED, 60, false);
    let recollected = run_edits(SEED, 60, true);

    assert_eq!(
        placed_areas(&patched),
        placed_areas(&recollected),
        "Инкрементальный патч разошёлся с полной коллекцией"
    );
}
