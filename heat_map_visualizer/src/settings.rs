use crate::colormap::Colormap;
use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The `output_settings` section of the application config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Root directory; JSON goes to `detect/`, the animation to `video/`.
    pub output_dir: PathBuf,
    #[serde(rename = "output_video_fps")]
    pub fps: u32,
    #[serde(rename = "output_video_width")]
    pub width: u32,
    #[serde(rename = "output_video_height")]
    pub height: u32,
    pub cmap: Colormap,
    /// Append a colour bar to the right of each frame.
    #[serde(rename = "cbar")]
    pub colorbar: bool,
    /// Count mapped to the bottom of the colormap.
    pub min: f64,
    /// Count mapped to the top of the colormap. `0` means the window size.
    pub max: f64,
    /// Blend the heat over the source frame when one is available.
    pub overlay: bool,
    /// Opacity of the heat layer when overlaid.
    pub transparency: f64,
}

impl OutputSettings {
    pub fn validate(&self) -> RenderResult<()> {
        if self.fps == 0 {
            return Err(RenderError::InvalidSettings(
                "output_video_fps must be greater than zero".into(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSettings(format!(
                "output video size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            return Err(RenderError::InvalidSettings(format!(
                "transparency must be within [0, 1], got {}",
                self.transparency
            )));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(RenderError::InvalidSettings("min and max must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn settings(output_dir: PathBuf) -> OutputSettings {
        OutputSettings {
            output_dir,
            fps: 10,
            width: 80,
            height: 60,
            cmap: Colormap::Gray,
            colorbar: false,
            min: 0.0,
            max: 0.0,
            overlay: false,
            transparency: 0.5,
        }
    }

    #[test]
    fn parses_config_file_key_names() {
        let json = r#"{
            "output_dir": "out",
            "output_video_fps": 15,
            "output_video_width": 640,
            "output_video_height": 480,
            "cmap": "viridis",
            "cbar": true,
            "min": 0,
            "max": 10,
            "overlay": true,
            "transparency": 0.4
        }"#;
        let parsed: OutputSettings = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.fps, 15);
        assert_eq!(parsed.cmap, Colormap::Viridis);
        assert!(parsed.colorbar);
        assert_eq!(parsed.max, 10.0);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut s = settings(PathBuf::from("out"));
        s.fps = 0;
        assert!(s.validate().is_err());

        let mut s = settings(PathBuf::from("out"));
        s.transparency = 1.2;
        assert!(s.validate().is_err());
    }
}
