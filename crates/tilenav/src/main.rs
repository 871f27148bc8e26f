//! Headless демо TILENAV
//!
//! Генерирует seeded грид, собирает sources, применяет случайные edit'ы и
//! запрашивает bounded rebuild'ы — без рендера.

use bevy::prelude::*;
use rand::Rng;
use tilenav::grid::generate_grid;
use tilenav::logger::log_info;
use tilenav::{
    create_headless_app, BakeBounds, CellCoord, DeterministicRng, GridLayout, NavRebuildState,
    NavSourceCache, RequestNavRebuild, SetTileIntent, TileId, TileNavPlugin,
};

const GRID_SIZE: i32 = 64;
const EDIT_FRAMES: usize = 200;
const EDITS_PER_FRAME: usize = 8;

fn main() {
    let seed = 42;
    println!("Starting TILENAV headless demo (seed: {})", seed);

    let mut app = create_headless_app(seed);

    let palette: Vec<TileId> = (1..=6).map(TileId).collect();
    let grid = {
        let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
        generate_grid(&mut rng.rng, GridLayout::default(), GRID_SIZE, GRID_SIZE, &palette, 0.85)
    };
    log_info(&format!("Grid generated: {} occupied cells", grid.occupied_count()));

    app.insert_resource(grid).add_plugins(TileNavPlugin::default());

    for frame in 0..EDIT_FRAMES {
        let edits: Vec<SetTileIntent> = {
            let mut rng = app.world_mut().resource_mut::<DeterministicRng>();
            (0..EDITS_PER_FRAME)
                .map(|_| {
                    let coord = CellCoord::new(rng.rng.gen_range(0..GRID_SIZE), rng.rng.gen_range(0..GRID_SIZE), 0);
                    let tile = rng
                        .rng
                        .gen_bool(0.9)
                        .then(|| palette[rng.rng.gen_range(0..palette.len())]);
                    SetTileIntent { coord, tile }
                })
                .collect()
        };
        for edit in edits {
            app.world_mut().send_event(edit);
        }

        // Rebuild окна 16x16 вокруг случайной точки каждые 20 кадров
        if frame % 20 == 0 {
            let corner = Vec3::new((frame % GRID_SIZE as usize) as f32, -1.0, 0.0);
            app.world_mut()
                .send_event(RequestNavRebuild::within(BakeBounds::new(corner, Vec3::new(16.0, 2.0, 16.0))));
        }

        app.update();
    }

    // Финальный полный rebuild и ожидание результата (poll каждый кадр)
    app.world_mut().send_event(RequestNavRebuild::everywhere());
    app.update();
    for _ in 0..1000 {
        if !app.world().resource::<NavRebuildState>().is_rebuilding() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
        app.update();
    }

    let cache = app.world().resource::<NavSourceCache>();
    let stats = cache.stats();
    println!(
        "Cache: {} sources, {} collections, {} index builds, {} batches, {} patched / {} unchanged / {} unindexed / {} unresolved",
        cache.sources().len(),
        stats.collections,
        stats.index_builds,
        stats.batches_applied,
        stats.patches.patched,
        stats.patches.unchanged,
        stats.patches.unindexed,
        stats.patches.unresolved
    );

    let state = app.world().resource::<NavRebuildState>();
    if let Some(surface) = state.surface() {
        println!(
            "Surface: {} walkable cells, {} blocked (rebuilds: {} done, {} deferred, {} cancelled)",
            surface.walkable.len(),
            surface.blocked,
            state.completed,
            state.deferred,
            state.cancelled
        );
    }

    println!("Demo complete!");
}
