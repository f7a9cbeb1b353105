use image::Rgb;
use serde::{Deserialize, Serialize};

/// Colour ramps for turning normalised heat into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Dark blue → cyan → yellow → dark red.
    Jet,
    /// Black → red → yellow → white.
    Hot,
    #[serde(alias = "grey")]
    Gray,
    /// Purple → teal → yellow.
    Viridis,
}

type Anchor = (f32, [u8; 3]);

const JET: &[Anchor] = &[
    (0.0, [0, 0, 128]),
    (0.125, [0, 0, 255]),
    (0.375, [0, 255, 255]),
    (0.625, [255, 255, 0]),
    (0.875, [255, 0, 0]),
    (1.0, [128, 0, 0]),
];

const HOT: &[Anchor] = &[
    (0.0, [10, 0, 0]),
    (0.375, [255, 0, 0]),
    (0.75, [255, 255, 0]),
    (1.0, [255, 255, 255]),
];

const GRAY: &[Anchor] = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const VIRIDIS: &[Anchor] = &[
    (0.0, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.5, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.0, [253, 231, 37]),
];

impl Colormap {
    fn anchors(self) -> &'static [Anchor] {
        match self {
            Colormap::Jet => JET,
            Colormap::Hot => HOT,
            Colormap::Gray => GRAY,
            Colormap::Viridis => VIRIDIS,
        }
    }

    /// Colour at position `t`, clamped to `[0, 1]`. Linear between anchors.
    pub fn color(self, t: f32) -> Rgb<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let anchors = self.anchors();

        for pair in anchors.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = (t1 - t0).max(f32::EPSILON);
                let ratio = (t - t0) / span;
                let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * ratio).round() as u8;
                return Rgb([lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])]);
            }
        }
        Rgb(anchors[anchors.len() - 1].1)
    }
}
