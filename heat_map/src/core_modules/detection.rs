// THEORY:
// Detections are "dumb" data containers in pixel space. A `BBox` is what the
// detection source delivers; a `Point` is the reduced form used in point mode.
// Neither knows anything about the grid.
//
// Validation lives here because it only needs the image bounds: a box that is
// inverted, negative or hanging off the image is refused one detection at a
// time, so a single bad entry never poisons the rest of its frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A detection rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// A single representative pixel of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Reasons a single detection is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("box is inverted horizontally: right ({right}) < left ({left})")]
    InvertedHorizontal { left: i32, right: i32 },
    #[error("box is inverted vertically: bottom ({bottom}) < top ({top})")]
    InvertedVertical { top: i32, bottom: i32 },
    #[error("box {0:?} has a negative coordinate")]
    Negative(BBox),
    #[error("box {bbox:?} extends beyond the {width}x{height} image")]
    OutOfBounds { bbox: BBox, width: u32, height: u32 },
}

impl BBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Checks the box against a `width` x `height` image.
    /// Edges may touch the far border (`right == width`), but not pass it.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), DetectionError> {
        if self.right < self.left {
            return Err(DetectionError::InvertedHorizontal {
                left: self.left,
                right: self.right,
            });
        }
        if self.bottom < self.top {
            return Err(DetectionError::InvertedVertical {
                top: self.top,
                bottom: self.bottom,
            });
        }
        if self.left < 0 || self.top < 0 {
            return Err(DetectionError::Negative(*self));
        }
        if i64::from(self.right) > i64::from(width) || i64::from(self.bottom) > i64::from(height) {
            return Err(DetectionError::OutOfBounds {
                bbox: *self,
                width,
                height,
            });
        }
        Ok(())
    }
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32, i32, i32)> for BBox {
    fn from((left, top, right, bottom): (i32, i32, i32, i32)) -> Self {
        Self::new(left, top, right, bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_box_touching_far_border() {
        assert_eq!(BBox::new(300, 300, 400, 400).validate(400, 400), Ok(()));
        assert_eq!(BBox::new(10, 10, 10, 10).validate(400, 400), Ok(()));
    }

    #[test]
    fn rejects_inverted_boxes() {
        assert_eq!(
            BBox::new(50, 0, 40, 10).validate(400, 400),
            Err(DetectionError::InvertedHorizontal { left: 50, right: 40 })
        );
        assert_eq!(
            BBox::new(0, 50, 10, 40).validate(400, 400),
            Err(DetectionError::InvertedVertical { top: 50, bottom: 40 })
        );
    }

    #[test]
    fn rejects_negative_and_overflowing_boxes() {
        let negative = BBox::new(-1, 0, 10, 10);
        assert_eq!(negative.validate(400, 400), Err(DetectionError::Negative(negative)));

        let wide = BBox::new(0, 0, 401, 10);
        assert_eq!(
            wide.validate(400, 400),
            Err(DetectionError::OutOfBounds { bbox: wide, width: 400, height: 400 })
        );
    }

    #[test]
    fn serializes_with_edge_names() {
        let json = serde_json::to_string(&BBox::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"left":1,"top":2,"right":3,"bottom":4}"#);
    }
}
