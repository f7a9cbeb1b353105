// THEORY:
// The `CoordinateMapper` is the bridge between pixel space and grid space. It is
// a stateless utility that only knows the size of one cell.
//
// Cell indices are returned as signed, unclamped values. Rectangle expansion and
// point spreading both need to step outside the grid before clamping or bounds
// checking, so clamping is left to the caller.

use crate::core_modules::detection::{BBox, Point};
use crate::core_modules::grid_config::GridConfig;

/// A grid position, possibly outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Column index.
    pub h: i64,
    /// Row index.
    pub v: i64,
}

/// Converts pixel coordinates into grid cell indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    grid_size_h: i64,
    grid_size_v: i64,
}

impl CoordinateMapper {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            grid_size_h: i64::from(config.grid_size_h()),
            grid_size_v: i64::from(config.grid_size_v()),
        }
    }

    /// Floor-divides a pixel position by the cell size on each axis.
    pub fn pixel_to_cell(&self, x: i32, y: i32) -> Cell {
        Cell {
            h: i64::from(x).div_euclid(self.grid_size_h),
            v: i64::from(y).div_euclid(self.grid_size_v),
        }
    }
}

/// Reduces a box to one point: horizontally centred, and `ratio` of the way
/// from the top edge to the bottom edge.
pub fn bbox_to_point(bbox: &BBox, ratio: f64) -> Point {
    let x = ((f64::from(bbox.left) + f64::from(bbox.right)) / 2.0).floor();
    let y = (f64::from(bbox.top) * (1.0 - ratio) + f64::from(bbox.bottom) * ratio).floor();
    Point::new(x as i32, y as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::grid_config::HeatMapParams;

    fn mapper() -> CoordinateMapper {
        let config = GridConfig::new(HeatMapParams {
            image_size_h: 400,
            image_size_v: 300,
            grid_num_h: 4,
            grid_num_v: 6,
            window_size: 1,
            spread_radius: 0,
            point_mode: false,
            point_ratio: 1.0,
        })
        .unwrap();
        CoordinateMapper::new(&config)
    }

    #[test]
    fn divides_by_cell_size() {
        let mapper = mapper();
        assert_eq!(mapper.pixel_to_cell(0, 0), Cell { h: 0, v: 0 });
        assert_eq!(mapper.pixel_to_cell(99, 49), Cell { h: 0, v: 0 });
        assert_eq!(mapper.pixel_to_cell(100, 50), Cell { h: 1, v: 1 });
        assert_eq!(mapper.pixel_to_cell(399, 299), Cell { h: 3, v: 5 });
    }

    #[test]
    fn does_not_clamp_far_border() {
        assert_eq!(mapper().pixel_to_cell(400, 300), Cell { h: 4, v: 6 });
    }

    #[test]
    fn point_is_centred_and_bottom_weighted() {
        let bbox = BBox::new(10, 20, 31, 60);
        assert_eq!(bbox_to_point(&bbox, 1.0), Point::new(20, 60));
        assert_eq!(bbox_to_point(&bbox, 0.0), Point::new(20, 20));
        assert_eq!(bbox_to_point(&bbox, 0.5), Point::new(20, 40));
        assert_eq!(bbox_to_point(&bbox, 0.25), Point::new(20, 30));
    }
}
