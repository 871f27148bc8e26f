//! Grid coordinates, tile identities и layout грида в мировом пространстве

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Координата ячейки грида (x, y, layer)
///
/// Equality по значению, используется как ключ в `GridSourceIndex`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, Reflect,
)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub layer: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32, layer: i32) -> Self {
        Self { x, y, layer }
    }

    /// Ключ сортировки для детерминированного обхода: layer → y → x
    pub fn scan_key(&self) -> (i32, i32, i32) {
        (self.layer, self.y, self.x)
    }
}

/// Визуальная/логическая идентичность тайла (палитра хоста)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect,
)]
pub struct TileId(pub u32);

/// Layout грида: размер ячейки + origin
///
/// Маппинг осей:
/// - grid x → world X
/// - grid y → world Z (горизонтальная плоскость)
/// - layer → world Y (высота)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub cell_size: Vec3,
    pub origin: Vec3,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_size: Vec3::ONE,
            origin: Vec3::ZERO,
        }
    }
}

impl GridLayout {
    pub fn new(cell_size: Vec3, origin: Vec3) -> Self {
        Self { cell_size, origin }
    }

    /// Центр ячейки в world space (сюда ставится transform build source)
    /// Все компоненты `cell_size` конечны и > 0 (иначе `cell_at` делит на ноль)
    pub fn is_valid(&self) -> bool {
        self.cell_size.is_finite() && self.cell_size.cmpgt(Vec3::ZERO).all() && self.origin.is_finite()
    }

    pub fn cell_center(&self, coord: CellCoord) -> Vec3 {
        self.origin
            + Vec3::new(
                (coord.x as f32 + 0.5) * self.cell_size.x,
                (coord.layer as f32 + 0.5) * self.cell_size.y,
                (coord.y as f32 + 0.5) * self.cell_size.z,
            )
    }

    /// Ячейка, содержащая world position (обратное к `cell_center`)
    pub fn cell_at(&self, position: Vec3) -> CellCoord {
        let local = (position - self.origin) / self.cell_size;
        CellCoord {
            x: local.x.floor() as i32,
            y: local.z.floor() as i32,
            layer: local.y.floor() as i32,
        }
    }

    /// Transform для build source ячейки (масштаб = размер ячейки)
    pub fn cell_transform(&self, coord: CellCoord) -> Transform {
        Transform::from_translation(self.cell_center(coord)).with_scale(self.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_center_round_trip() {
        let layout = GridLayout::new(Vec3::new(2.0, 0.5, 1.5), Vec3::new(-10.0, 3.0, 4.0));

        for coord in [
            CellCoord::new(0, 0, 0),
            CellCoord::new(-3, 7, 1),
            CellCoord::new(12, -5, -2),
        ] {
            assert_eq!(layout.cell_at(layout.cell_center(coord)), coord);
        }
    }

    #[test]
    fn test_axis_mapping() {
        let layout = GridLayout::default();
        let center = layout.cell_center(CellCoord::new(1, 2, 3));

        // grid y → world Z, layer → world Y
        assert_eq!(center, Vec3::new(1.5, 3.5, 2.5));
    }

    #[test]
    fn test_scan_key_orders_by_layer_first() {
        let mut coords = vec![
            CellCoord::new(5, 0, 1),
            CellCoord::new(0, 1, 0),
            CellCoord::new(1, 0, 0),
        ];
        coords.sort_by_key(CellCoord::scan_key);

        assert_eq!(
            coords,
            vec![
                CellCoord::new(1, 0, 0),
                CellCoord::new(0, 1, 0),
                CellCoord::new(5, 0, 1),
            ]
        );
    }
}
