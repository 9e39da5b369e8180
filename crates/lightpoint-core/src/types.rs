use serde::{Deserialize, Serialize};

/// One 8-bit colour sample in BGR channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bgr {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }
}

/// HSV triple on the 8-bit OpenCV scale: hue 0–179, saturation and value 0–255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Per-channel arithmetic mean of a region's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanColor {
    pub b: f32,
    pub g: f32,
    pub r: f32,
}

impl MeanColor {
    /// Quantise to an 8-bit colour, truncating the fractional part.
    pub fn to_bgr(self) -> Bgr {
        let q = |c: f32| c.clamp(0.0, 255.0) as u8;
        Bgr::new(q(self.b), q(self.g), q(self.r))
    }
}

/// Axis-aligned pixel bounds, inclusive of `x`/`y`, exclusive of `x + width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One connected bright blob of the stencil.
///
/// Regions are built once per normalised stencil and never change; the
/// classifier borrows them for every incoming frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Stable identifier: position in raster-scan discovery order.
    pub id: usize,
    /// Row-major pixel indices belonging to this region, ascending.
    pub pixels: Vec<usize>,
    /// Number of member pixels.
    pub area: usize,
    pub bounds: BoundingBox,
    /// Mean member coordinate (x, y).
    pub centroid: (f32, f32),
    /// Dimensions of the stencil the region was extracted from.
    pub stencil_width: u32,
    pub stencil_height: u32,
}

/// Which signals voted a region red.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedSignals {
    /// Per-pixel HSV ratio exceeded the configured minimum.
    pub hsv_ratio: bool,
    /// Mean colour passed the BGR dominance heuristic.
    pub bgr_mean: bool,
    /// Mean colour's hue fell in a red band (only evaluated when enabled).
    pub mean_hue: bool,
}

impl RedSignals {
    pub fn any(&self) -> bool {
        self.hsv_ratio || self.bgr_mean || self.mean_hue
    }
}

/// Classification result for one region in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorVerdict {
    pub region_id: usize,
    pub is_red: bool,
    /// Fraction of sampled pixels that passed the HSV test, in [0, 1].
    pub red_ratio: f32,
    pub mean_color: MeanColor,
    pub mean_hsv: Hsv,
    /// Pixels that went through the per-pixel HSV test.
    pub sampled: usize,
    pub red_pixels: usize,
    pub signals: RedSignals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_color_truncates() {
        let mean = MeanColor { b: 0.4, g: 127.9, r: 300.0 };
        assert_eq!(mean.to_bgr(), Bgr::new(0, 127, 255));
        let mean = MeanColor { b: -3.0, g: 99.99, r: 254.5 };
        assert_eq!(mean.to_bgr(), Bgr::new(0, 99, 254));
    }

    #[test]
    fn test_signals_any() {
        assert!(!RedSignals::default().any());
        let s = RedSignals { bgr_mean: true, ..Default::default() };
        assert!(s.any());
    }
}
