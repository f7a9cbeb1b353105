/// A `grid_num_v` x `grid_num_h` table of detection counts, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityGrid {
    width: usize,
    height: usize,
    cells: Vec<i32>,
}

impl DensityGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Count at column `h`, row `v`, or `None` outside the grid.
    pub fn get(&self, h: usize, v: usize) -> Option<i32> {
        if h < self.width && v < self.height {
            Some(self.cells[v * self.width + h])
        } else {
            None
        }
    }

    /// Adds `delta` to the cell at column `h`, row `v`. Callers guarantee bounds.
    pub(crate) fn add(&mut self, h: usize, v: usize, delta: i32) {
        debug_assert!(h < self.width && v < self.height, "cell ({h}, {v}) outside grid");
        self.cells[v * self.width + h] += delta;
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Sum of all cells.
    pub fn total(&self) -> i64 {
        self.cells.iter().map(|&c| i64::from(c)).sum()
    }

    /// An owned copy of the grid as rows, `snapshot[v][h]`.
    pub fn snapshot(&self) -> Vec<Vec<i32>> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_row_major_and_detached() {
        let mut grid = DensityGrid::new(3, 2);
        grid.add(2, 0, 1);
        grid.add(0, 1, 2);
        let snapshot = grid.snapshot();
        assert_eq!(snapshot, vec![vec![0, 0, 1], vec![2, 0, 0]]);

        grid.add(2, 0, 5);
        assert_eq!(snapshot[0][2], 1);
        assert_eq!(grid.get(2, 0), Some(6));
        assert_eq!(grid.total(), 8);
    }

    #[test]
    fn get_outside_grid_is_none() {
        let grid = DensityGrid::new(3, 2);
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }
}
