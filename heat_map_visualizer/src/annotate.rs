use crate::error::{RenderError, RenderResult};
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

const FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const LABEL_COLOR: Rgb<u8> = Rgb([0, 225, 0]);
const MARGIN: i32 = 5;

/// Stamps `number of detects : N` in the top-left corner of a frame.
#[derive(Clone)]
pub struct DetectCountLabel {
    font: FontRef<'static>,
}

impl DetectCountLabel {
    pub fn new() -> RenderResult<Self> {
        let font = FontRef::try_from_slice(FONT)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    /// Text height scales with the smaller side of the frame.
    fn scale(width: u32, height: u32) -> PxScale {
        PxScale::from((width.min(height) as f32 * 0.03).max(10.0))
    }

    pub fn draw(&self, frame: &mut RgbImage, number_of_detects: usize) {
        let text = format!("number of detects : {number_of_detects}");
        let scale = Self::scale(frame.width(), frame.height());
        let (_, text_height) = text_size(scale, &self.font, &text);
        draw_text_mut(
            frame,
            LABEL_COLOR,
            MARGIN,
            text_height as i32,
            scale,
            &self.font,
            &text,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_green_text_near_top_left() {
        let label = DetectCountLabel::new().unwrap();
        let mut frame = RgbImage::new(320, 240);
        label.draw(&mut frame, 12);

        let lit: Vec<(u32, u32)> = frame
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(_, y)| y < 60));
        assert!(lit.iter().all(|(x, y)| {
            let p = frame.get_pixel(*x, *y);
            p[0] == 0 && p[2] == 0 && p[1] > 0
        }));
    }

    #[test]
    fn label_grows_with_frame() {
        let small = DetectCountLabel::scale(100, 100);
        let large = DetectCountLabel::scale(1280, 720);
        assert_eq!(small.y, 10.0);
        assert!(large.y > small.y);
    }
}
