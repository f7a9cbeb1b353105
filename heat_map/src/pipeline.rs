// THEORY:
// The `pipeline` module is the top-level API of the heat map engine. A
// `HeatMapPipeline` is the grid accumulator: it owns the sliding window and the
// density grid, and turns each incoming frame of boxes into a `HeatMapRecord`.
//
// Key architectural principles:
// 1.  **One Mode, Chosen Once**: Rectangle or point accumulation is fixed when the
//     pipeline is built. The choice is an enum variant holding a window and grid
//     typed to that representation, so a frame can never be applied with the
//     wrong footprint.
// 2.  **Window Equals Grid**: At every point the grid is the sum of the
//     contributions of exactly the frames held in the window. A frame that ages
//     out is subtracted using the very values that were added.
// 3.  **Snapshots Out**: Callers receive owned copies of the grid. Nothing outside
//     this struct can touch the live state, and `process` takes `&mut self`, so
//     an instance is driven by one caller at a time.

use crate::core_modules::coordinate_mapper::{CoordinateMapper, bbox_to_point};
use crate::core_modules::density_grid::DensityGrid;
use crate::core_modules::density_updater::{Delta, DensityUpdater, Footprint};
use crate::core_modules::grid_config::{ConfigResult, GridConfig, HeatMapParams};
use crate::core_modules::sliding_window::SlidingWindow;
use tracing::{debug, info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::detection::{BBox, DetectionError, Point};
pub use crate::core_modules::result_record::{HeatMapRecord, RecordDetections};
pub use crate::core_modules::sliding_window::WindowState;

/// A sliding window of frames and the grid that mirrors it.
#[derive(Debug, Clone)]
struct WindowedGrid<D> {
    window: SlidingWindow<Vec<D>>,
    grid: DensityGrid,
    updater: DensityUpdater,
}

impl<D: Footprint> WindowedGrid<D> {
    fn new(config: &GridConfig) -> Self {
        Self {
            window: SlidingWindow::new(config.window_size()),
            grid: DensityGrid::new(config.grid_num_h() as usize, config.grid_num_v() as usize),
            updater: DensityUpdater::new(CoordinateMapper::new(config), config.spread_radius()),
        }
    }

    /// Undoes the oldest frame if the window is full, then adds `frame`.
    /// Returns whether a frame was evicted.
    fn ingest(&mut self, frame: Vec<D>) -> bool {
        let evicted = self.window.push(frame);
        if let Some(oldest) = &evicted {
            self.updater.apply_frame(&mut self.grid, oldest, Delta::Subtract);
        }
        if let Some(newest) = self.window.newest() {
            self.updater.apply_frame(&mut self.grid, newest, Delta::Add);
        }
        evicted.is_some()
    }

    fn rebuild(&self) -> DensityGrid {
        let mut grid = DensityGrid::new(self.grid.width(), self.grid.height());
        for frame in self.window.iter() {
            self.updater.apply_frame(&mut grid, frame, Delta::Add);
        }
        grid
    }
}

#[derive(Debug, Clone)]
enum Accumulator {
    Rectangle(WindowedGrid<BBox>),
    Point(WindowedGrid<Point>),
}

/// The grid accumulator.
#[derive(Debug, Clone)]
pub struct HeatMapPipeline {
    config: GridConfig,
    accumulator: Accumulator,
    frames_processed: u64,
}

impl HeatMapPipeline {
    pub fn new(config: GridConfig) -> Self {
        let accumulator = if config.point_mode() {
            Accumulator::Point(WindowedGrid::new(&config))
        } else {
            Accumulator::Rectangle(WindowedGrid::new(&config))
        };
        info!(
            grid = %format!("{}x{}", config.grid_num_h(), config.grid_num_v()),
            cell = %format!("{}x{}", config.grid_size_h(), config.grid_size_v()),
            window = config.window_size(),
            spread_radius = config.spread_radius(),
            point_mode = config.point_mode(),
            "heat map pipeline configured"
        );
        Self {
            config,
            accumulator,
            frames_processed: 0,
        }
    }

    /// Validates raw parameters and builds a pipeline from them.
    pub fn from_params(params: HeatMapParams) -> ConfigResult<Self> {
        Ok(Self::new(GridConfig::new(params)?))
    }

    /// Read-only geometry for renderers.
    pub fn geometry(&self) -> &GridConfig {
        &self.config
    }

    /// Processes one frame of detections.
    ///
    /// Invalid boxes are dropped individually and counted in the record's
    /// `rejected` field; the rest of the frame is still accumulated.
    pub fn process(&mut self, detections: &[BBox]) -> HeatMapRecord {
        let (accepted, rejected) = self.accept(detections);
        let state_before = self.window_state();

        let ratio = self.config.point_ratio();

        let (record_detections, evicted) = match &mut self.accumulator {
            Accumulator::Rectangle(windowed) => {
                let evicted = windowed.ingest(accepted.clone());
                (RecordDetections::BBoxes(accepted), evicted)
            }
            Accumulator::Point(windowed) => {
                let points: Vec<Point> = accepted
                    .iter()
                    .map(|bbox| bbox_to_point(bbox, ratio))
                    .collect();
                let evicted = windowed.ingest(points.clone());
                (RecordDetections::Positions(points), evicted)
            }
        };

        self.frames_processed += 1;
        if evicted {
            debug!(frame = self.frames_processed, "oldest frame left the window");
        }
        if state_before == WindowState::NotFull && self.window_state() == WindowState::Full {
            info!(
                frame = self.frames_processed,
                window = self.config.window_size(),
                "sliding window is full; older frames will now be evicted"
            );
        }

        HeatMapRecord::new(record_detections, self.grid().snapshot(), rejected)
    }

    fn accept(&self, detections: &[BBox]) -> (Vec<BBox>, usize) {
        let mut accepted = Vec::with_capacity(detections.len());
        let mut rejected = 0;
        for bbox in detections {
            match bbox.validate(self.config.image_size_h(), self.config.image_size_v()) {
                Ok(()) => accepted.push(*bbox),
                Err(err) => {
                    rejected += 1;
                    warn!(frame = self.frames_processed + 1, %err, "rejecting detection");
                }
            }
        }
        (accepted, rejected)
    }

    /// The live grid.
    pub fn grid(&self) -> &DensityGrid {
        match &self.accumulator {
            Accumulator::Rectangle(windowed) => &windowed.grid,
            Accumulator::Point(windowed) => &windowed.grid,
        }
    }

    /// Recomputes the grid from scratch from the frames currently in the window.
    pub fn rebuild_grid(&self) -> DensityGrid {
        match &self.accumulator {
            Accumulator::Rectangle(windowed) => windowed.rebuild(),
            Accumulator::Point(windowed) => windowed.rebuild(),
        }
    }

    pub fn window_state(&self) -> WindowState {
        match &self.accumulator {
            Accumulator::Rectangle(windowed) => windowed.window.state(),
            Accumulator::Point(windowed) => windowed.window.state(),
        }
    }

    pub fn frames_in_window(&self) -> usize {
        match &self.accumulator {
            Accumulator::Rectangle(windowed) => windowed.window.len(),
            Accumulator::Point(windowed) => windowed.window.len(),
        }
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}
