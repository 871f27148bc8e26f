//! Owning builder: полная коллекция build sources из грида
//!
//! Один source на занятую ячейку, в детерминированном порядке layer → y → x.
//! Area = resolve тайла, иначе `NavBuildSettings::default_area`.

use crate::grid::GridWorld;
use crate::modifier::TileModifier;
use crate::rebuild::NavBuildSettings;
use crate::source::{BuildSource, GeometryRef, SourceList};

pub fn collect_sources(grid: &GridWorld, modifier: &TileModifier, settings: &NavBuildSettings) -> SourceList {
    let layout = grid.layout;
    let sources = grid
        .occupied_cells()
        .into_iter()
        .filter_map(|(coord, tile)| {
            let transform = layout.cell_transform(coord);
            if let Some(volume) = settings.collect_volume {
                if !volume.contains(transform.translation) {
                    return None;
                }
            }
            Some(BuildSource {
                geometry: GeometryRef::for_tile(tile),
                transform,
                area: modifier.resolve(tile).unwrap_or(settings.default_area),
            })
        })
        .collect();

    SourceList::new(layout, sources)
}
