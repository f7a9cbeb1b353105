// THEORY:
// This file is the main entry point for the `heat_map` library crate. It
// exposes the `HeatMapPipeline` (the sliding-window grid accumulator) together
// with the geometry and record types that collaborators need: a detection
// source feeds it boxes, and a renderer consumes the records it returns.
//
// The internal layers (`core_modules`) stay public for testing and advanced
// use, but the intended surface is the `pipeline` module and the re-exports
// below.

pub mod core_modules;
pub mod pipeline;

pub use core_modules::grid_config::{ConfigError, ConfigResult, GridConfig, HeatMapParams};
pub use pipeline::{
    BBox, DetectionError, HeatMapPipeline, HeatMapRecord, Point, RecordDetections, WindowState,
};
