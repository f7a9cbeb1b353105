// THEORY:
// The renderer turns one grid snapshot into one picture. Each cell is painted
// as the block of pixels it covers in the source image, coloured by its count
// normalised into `[min, max]`. The picture is optionally blended over the
// source frame, given a colour bar, and finally scaled to the output size.
//
// Key architectural principles:
// 1.  **Image Space First**: Compositing happens at the source image size, so
//     cell boundaries and the background line up exactly. Only the final
//     frame is resampled.
// 2.  **Colours Per Cell**: A grid has far fewer cells than pixels, so each
//     cell's colour is computed once and then splatted over its block.

use crate::colormap::Colormap;
use crate::error::{RenderError, RenderResult};
use crate::settings::OutputSettings;
use heat_map::GridConfig;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

#[derive(Debug, Clone)]
pub struct HeatMapRenderer {
    cmap: Colormap,
    min: f64,
    max: f64,
    colorbar: bool,
    overlay: bool,
    transparency: f32,
    image_width: u32,
    image_height: u32,
    cell_width: u32,
    cell_height: u32,
    output_width: u32,
    output_height: u32,
}

impl HeatMapRenderer {
    /// A `max` of zero is replaced by the window size, the largest count a
    /// cell can reach with one detection per frame.
    pub fn new(settings: &OutputSettings, geometry: &GridConfig) -> RenderResult<Self> {
        settings.validate()?;
        let max = if settings.max == 0.0 {
            geometry.window_size() as f64
        } else {
            settings.max
        };
        if max <= settings.min {
            return Err(RenderError::InvalidSettings(format!(
                "max ({max}) must be greater than min ({})",
                settings.min
            )));
        }
        Ok(Self {
            cmap: settings.cmap,
            min: settings.min,
            max,
            colorbar: settings.colorbar,
            overlay: settings.overlay,
            transparency: settings.transparency as f32,
            image_width: geometry.image_size_h(),
            image_height: geometry.image_size_v(),
            cell_width: geometry.grid_size_h(),
            cell_height: geometry.grid_size_v(),
            output_width: settings.width,
            output_height: settings.height,
        })
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Effective upper bound of the colour scale.
    pub fn max(&self) -> f64 {
        self.max
    }

    fn normalize(&self, value: i32) -> f32 {
        (((value as f64) - self.min) / (self.max - self.min)).clamp(0.0, 1.0) as f32
    }

    /// The grid painted at source image resolution, without background.
    pub fn heat_raster(&self, griddata: &[Vec<i32>]) -> RgbImage {
        let colors: Vec<Vec<Rgb<u8>>> = griddata
            .iter()
            .map(|row| row.iter().map(|&v| self.cmap.color(self.normalize(v))).collect())
            .collect();
        let empty = self.cmap.color(self.normalize(0));

        RgbImage::from_fn(self.image_width, self.image_height, |x, y| {
            let h = (x / self.cell_width) as usize;
            let v = (y / self.cell_height) as usize;
            colors
                .get(v)
                .and_then(|row| row.get(h))
                .copied()
                .unwrap_or(empty)
        })
    }

    /// Heat layer, background blend and colour bar, before resampling.
    pub fn compose(&self, griddata: &[Vec<i32>], background: Option<&DynamicImage>) -> RgbImage {
        let heat = self.heat_raster(griddata);
        let frame = match background {
            Some(bg) if self.overlay => blend(&heat, bg, self.transparency),
            _ => heat,
        };
        if self.colorbar {
            self.append_colorbar(&frame)
        } else {
            frame
        }
    }

    /// Renders a full output frame at the configured output size.
    pub fn render(&self, griddata: &[Vec<i32>], background: Option<&DynamicImage>) -> RgbImage {
        let frame = self.compose(griddata, background);
        if frame.dimensions() == (self.output_width, self.output_height) {
            return frame;
        }
        imageops::resize(&frame, self.output_width, self.output_height, FilterType::Triangle)
    }

    fn colorbar_width(&self) -> u32 {
        (self.image_width / 16).max(4)
    }

    fn append_colorbar(&self, frame: &RgbImage) -> RgbImage {
        let (width, height) = frame.dimensions();
        let gap = (self.colorbar_width() / 4).max(1);
        let bar_start = width + gap;
        let span = height.saturating_sub(1).max(1) as f32;

        RgbImage::from_fn(bar_start + self.colorbar_width(), height, |x, y| {
            if x < width {
                *frame.get_pixel(x, y)
            } else if x < bar_start {
                Rgb([255, 255, 255])
            } else {
                self.cmap.color(1.0 - y as f32 / span)
            }
        })
    }
}

/// `heat * alpha + background * (1 - alpha)`, with the background scaled to
/// the heat layer's size.
fn blend(heat: &RgbImage, background: &DynamicImage, alpha: f32) -> RgbImage {
    let (width, height) = heat.dimensions();
    let background = if background.width() == width && background.height() == height {
        background.to_rgb8()
    } else {
        background
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8()
    };

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let h = heat.get_pixel(x, y);
        let b = background.get_pixel(x, y);
        for c in 0..3 {
            let mixed = h[c] as f32 * alpha + b[c] as f32 * (1.0 - alpha);
            pixel[c] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
