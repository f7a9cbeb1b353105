// THEORY:
// `heat_map_visualizer` is the presentation side of the heat map. It consumes
// the `HeatMapRecord`s produced by `heat_map::HeatMapPipeline` and never feeds
// anything back into the accumulator.
//
// Key architectural principles:
// 1.  **Records In, Files Out**: The writer persists every record twice: as the
//     JSON document downstream tools read, and as one frame of an animated
//     heat map for people to look at.
// 2.  **Geometry From The Core**: Cell sizes and image dimensions come from the
//     validated `GridConfig`, so the picture always matches the grid that
//     produced it.

pub mod annotate;
pub mod colormap;
pub mod error;
pub mod render;
pub mod settings;
pub mod writer;

pub use annotate::DetectCountLabel;
pub use colormap::Colormap;
pub use error::{RenderError, RenderResult};
pub use render::HeatMapRenderer;
pub use settings::OutputSettings;
pub use writer::HeatMapWriter;
