// THEORY:
// The density updater is where a detection becomes a set of grid cells. Each
// detection representation implements `Footprint`, which adds or removes that
// detection's contribution with one shared `(grid, delta)` contract.
//
// Key architectural principles:
// 1.  **Exact Inverse**: A footprint depends only on the detection, the mapper and
//     the spread radius. Applying `Delta::Add` and then `Delta::Subtract` for the
//     same detection touches the same cells, so the grid returns to its previous
//     state bit for bit.
// 2.  **Half-Open Ranges**: Both footprints iterate `[low, high)` ranges. The last
//     column and row of a rectangle, and the far side of a point's candidate
//     square, are never touched. This asymmetry is part of the accumulated
//     counts and is kept as is.
// 3.  **Integer Distance**: The point spread keeps cells whose squared distance is
//     within the squared radius. This is the Euclidean test with no rounding.

use crate::core_modules::coordinate_mapper::CoordinateMapper;
use crate::core_modules::density_grid::DensityGrid;
use crate::core_modules::detection::{BBox, Point};

/// Direction of a grid update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// A frame entered the window.
    Add,
    /// A frame left the window.
    Subtract,
}

impl Delta {
    pub fn value(self) -> i32 {
        match self {
            Delta::Add => 1,
            Delta::Subtract => -1,
        }
    }
}

/// A detection representation that knows which cells it covers.
pub trait Footprint {
    fn apply(
        &self,
        grid: &mut DensityGrid,
        mapper: &CoordinateMapper,
        spread_radius: u32,
        delta: Delta,
    );
}

fn in_grid(grid: &DensityGrid, h: i64, v: i64) -> Option<(usize, usize)> {
    let h = usize::try_from(h).ok()?;
    let v = usize::try_from(v).ok()?;
    (h < grid.width() && v < grid.height()).then_some((h, v))
}

impl Footprint for BBox {
    /// Covers the corner-mapped cell rectangle, grown by `spread_radius` and
    /// clamped to the grid, excluding its right column and bottom row.
    fn apply(
        &self,
        grid: &mut DensityGrid,
        mapper: &CoordinateMapper,
        spread_radius: u32,
        delta: Delta,
    ) {
        let radius = i64::from(spread_radius);
        let max_h = grid.width() as i64 - 1;
        let max_v = grid.height() as i64 - 1;

        let top_left = mapper.pixel_to_cell(self.left, self.top);
        let bottom_right = mapper.pixel_to_cell(self.right, self.bottom);

        let left = (top_left.h - radius).clamp(0, max_h);
        let top = (top_left.v - radius).clamp(0, max_v);
        let right = (bottom_right.h + radius).min(max_h);
        let bottom = (bottom_right.v + radius).min(max_v);

        let step = delta.value();
        for v in top..bottom {
            for h in left..right {
                grid.add(h as usize, v as usize, step);
            }
        }
    }
}

impl Footprint for Point {
    /// Covers the cell under the point, or with a radius, the cells of the
    /// half-open candidate square that lie within `spread_radius` of it.
    /// Candidates outside the grid are skipped; the centre itself is never moved
    /// except in the radius-zero case, where a far-border point counts in the
    /// last row or column.
    fn apply(
        &self,
        grid: &mut DensityGrid,
        mapper: &CoordinateMapper,
        spread_radius: u32,
        delta: Delta,
    ) {
        let center = mapper.pixel_to_cell(self.x, self.y);
        let step = delta.value();

        if spread_radius == 0 {
            // A point on the far border maps one past the last cell.
            let h = center.h.clamp(0, grid.width() as i64 - 1);
            let v = center.v.clamp(0, grid.height() as i64 - 1);
            if let Some((h, v)) = in_grid(grid, h, v) {
                grid.add(h, v, step);
            }
            return;
        }

        let radius = i64::from(spread_radius);
        let radius_sq = radius * radius;
        for v in (center.v - radius)..(center.v + radius) {
            for h in (center.h - radius)..(center.h + radius) {
                let Some((cell_h, cell_v)) = in_grid(grid, h, v) else {
                    continue;
                };
                let dh = h - center.h;
                let dv = v - center.v;
                if dh * dh + dv * dv <= radius_sq {
                    grid.add(cell_h, cell_v, step);
                }
            }
        }
    }
}

/// Applies whole frames to a grid with a fixed mapper and radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityUpdater {
    mapper: CoordinateMapper,
    spread_radius: u32,
}

impl DensityUpdater {
    pub fn new(mapper: CoordinateMapper, spread_radius: u32) -> Self {
        Self {
            mapper,
            spread_radius,
        }
    }

    pub fn apply_frame<D: Footprint>(&self, grid: &mut DensityGrid, frame: &[D], delta: Delta) {
        for detection in frame {
            detection.apply(grid, &self.mapper, self.spread_radius, delta);
        }
    }
}
