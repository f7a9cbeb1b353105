// THEORY:
// The `GridConfig` is the geometric contract shared by every other module. It is
// built once from the raw parameter file and never changes afterwards.
//
// Key architectural principles:
// 1.  **Exact Tiling**: The image must be tiled by a whole number of equally sized
//     cells on both axes. Every pixel-to-cell conversion downstream relies on a
//     single, uniform cell size, so an image that does not divide evenly is
//     rejected here instead of producing a skewed grid later.
// 2.  **Raw vs. Validated**: `HeatMapParams` is the on-disk shape (field names
//     match the parameter file). `GridConfig` is the validated, derived form.
//     Only `GridConfig` is ever handed to the accumulator or the renderers.
// 3.  **Read-Only Exposure**: Fields are private and exposed through accessors so
//     that collaborators can read the geometry but cannot alter it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating the heat map parameters.
/// All of them are fatal: an accumulator is never built from a bad config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("image_size_h ({image_size}) is not divisible by grid_num_h ({grid_num})")]
    IndivisibleHorizontal { image_size: u32, grid_num: u32 },
    #[error("image_size_v ({image_size}) is not divisible by grid_num_v ({grid_num})")]
    IndivisibleVertical { image_size: u32, grid_num: u32 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("bbox2pix_ratio must be a finite value within [0, 1], got {0}")]
    RatioOutOfRange(f64),
    #[error("failed to read heat map parameters from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse heat map parameters")]
    Parse(#[from] serde_yml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_point_ratio() -> f64 {
    1.0
}

/// The heat map parameters exactly as they are written in the parameter file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatMapParams {
    /// Source image width in pixels.
    pub image_size_h: u32,
    /// Source image height in pixels.
    pub image_size_v: u32,
    /// Number of grid columns.
    pub grid_num_h: u32,
    /// Number of grid rows.
    pub grid_num_v: u32,
    /// How many of the most recent frames contribute to the grid.
    #[serde(rename = "last_valid_frame")]
    pub window_size: usize,
    /// How many neighbouring cells a detection spreads into.
    #[serde(rename = "number_of_add_grid")]
    pub spread_radius: u32,
    /// When set, each box is reduced to a single representative point.
    #[serde(rename = "bbox2pix")]
    pub point_mode: bool,
    /// Vertical interpolation weight between a box's top (0.0) and bottom (1.0).
    #[serde(rename = "bbox2pix_ratio", default = "default_point_ratio")]
    pub point_ratio: f64,
}

impl HeatMapParams {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }
}

/// Validated, immutable grid geometry and accumulation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    image_size_h: u32,
    image_size_v: u32,
    grid_num_h: u32,
    grid_num_v: u32,
    grid_size_h: u32,
    grid_size_v: u32,
    window_size: usize,
    spread_radius: u32,
    point_mode: bool,
    point_ratio: f64,
}

impl GridConfig {
    /// Validates the raw parameters and derives the cell size.
    pub fn new(params: HeatMapParams) -> ConfigResult<Self> {
        if params.image_size_h == 0 {
            return Err(ConfigError::Zero("image_size_h"));
        }
        if params.image_size_v == 0 {
            return Err(ConfigError::Zero("image_size_v"));
        }
        if params.grid_num_h == 0 {
            return Err(ConfigError::Zero("grid_num_h"));
        }
        if params.grid_num_v == 0 {
            return Err(ConfigError::Zero("grid_num_v"));
        }
        if params.window_size == 0 {
            return Err(ConfigError::Zero("last_valid_frame"));
        }
        if params.image_size_h % params.grid_num_h != 0 {
            return Err(ConfigError::IndivisibleHorizontal {
                image_size: params.image_size_h,
                grid_num: params.grid_num_h,
            });
        }
        if params.image_size_v % params.grid_num_v != 0 {
            return Err(ConfigError::IndivisibleVertical {
                image_size: params.image_size_v,
                grid_num: params.grid_num_v,
            });
        }
        if !params.point_ratio.is_finite() || !(0.0..=1.0).contains(&params.point_ratio) {
            return Err(ConfigError::RatioOutOfRange(params.point_ratio));
        }

        Ok(Self {
            grid_size_h: params.image_size_h / params.grid_num_h,
            grid_size_v: params.image_size_v / params.grid_num_v,
            image_size_h: params.image_size_h,
            image_size_v: params.image_size_v,
            grid_num_h: params.grid_num_h,
            grid_num_v: params.grid_num_v,
            window_size: params.window_size,
            spread_radius: params.spread_radius,
            point_mode: params.point_mode,
            point_ratio: params.point_ratio,
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::new(HeatMapParams::from_yaml_file(path)?)
    }

    pub fn image_size_h(&self) -> u32 {
        self.image_size_h
    }

    pub fn image_size_v(&self) -> u32 {
        self.image_size_v
    }

    pub fn grid_num_h(&self) -> u32 {
        self.grid_num_h
    }

    pub fn grid_num_v(&self) -> u32 {
        self.grid_num_v
    }

    /// Width of one cell in pixels.
    pub fn grid_size_h(&self) -> u32 {
        self.grid_size_h
    }

    /// Height of one cell in pixels.
    pub fn grid_size_v(&self) -> u32 {
        self.grid_size_v
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn spread_radius(&self) -> u32 {
        self.spread_radius
    }

    pub fn point_mode(&self) -> bool {
        self.point_mode
    }

    pub fn point_ratio(&self) -> f64 {
        self.point_ratio
    }
}

impl TryFrom<HeatMapParams> for GridConfig {
    type Error = ConfigError;

    fn try_from(params: HeatMapParams) -> ConfigResult<Self> {
        Self::new(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(image_size_h: u32, grid_num_h: u32) -> HeatMapParams {
        HeatMapParams {
            image_size_h,
            image_size_v: 100,
            grid_num_h,
            grid_num_v: 4,
            window_size: 3,
            spread_radius: 0,
            point_mode: false,
            point_ratio: 1.0,
        }
    }

    #[test]
    fn rejects_image_that_does_not_tile_evenly() {
        let err = GridConfig::new(params(100, 3)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IndivisibleHorizontal { image_size: 100, grid_num: 3 }
        ));
    }

    #[test]
    fn derives_cell_size_from_even_tiling() {
        let config = GridConfig::new(params(100, 4)).unwrap();
        assert_eq!(config.grid_size_h(), 25);
        assert_eq!(config.grid_size_v(), 25);
    }

    #[test]
    fn rejects_vertical_remainder() {
        let mut p = params(100, 4);
        p.image_size_v = 90;
        p.grid_num_v = 7;
        assert!(matches!(
            GridConfig::new(p),
            Err(ConfigError::IndivisibleVertical { image_size: 90, grid_num: 7 })
        ));
    }

    #[test]
    fn rejects_zero_sized_fields() {
        let mut p = params(100, 4);
        p.window_size = 0;
        assert!(matches!(GridConfig::new(p), Err(ConfigError::Zero("last_valid_frame"))));

        let p = params(100, 0);
        assert!(matches!(GridConfig::new(p), Err(ConfigError::Zero("grid_num_h"))));
    }

    #[test]
    fn rejects_ratio_outside_unit_interval() {
        let mut p = params(100, 4);
        p.point_ratio = 1.5;
        assert!(matches!(GridConfig::new(p), Err(ConfigError::RatioOutOfRange(_))));

        let mut p = params(100, 4);
        p.point_ratio = f64::NAN;
        assert!(matches!(GridConfig::new(p), Err(ConfigError::RatioOutOfRange(_))));
    }

    #[test]
    fn parses_parameter_file_with_default_ratio() {
        let yaml = "\
number_of_add_grid: 2
last_valid_frame: 30
image_size_h: 640
image_size_v: 480
grid_num_h: 32
grid_num_v: 24
bbox2pix: true
";
        let params = HeatMapParams::from_yaml_str(yaml).unwrap();
        assert_eq!(params.spread_radius, 2);
        assert_eq!(params.window_size, 30);
        assert!(params.point_mode);
        assert_eq!(params.point_ratio, 1.0);

        let config = GridConfig::try_from(params).unwrap();
        assert_eq!(config.grid_size_h(), 20);
        assert_eq!(config.grid_size_v(), 20);
    }

    #[test]
    fn missing_parameter_is_a_parse_error() {
        let yaml = "image_size_h: 640\nimage_size_v: 480\n";
        assert!(matches!(
            HeatMapParams::from_yaml_str(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = HeatMapParams::from_yaml_file("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
