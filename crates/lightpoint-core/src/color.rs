//! Colour-space conversion and the red decision boundaries.
//!
//! Hue follows the 8-bit OpenCV convention (degrees / 2, so 0–179) because
//! every calibration profile in use was tuned on that scale.

use crate::config::ClassifierConfig;
use crate::types::{Bgr, Hsv};

/// Convert one BGR sample to 8-bit HSV.
pub fn bgr_to_hsv(px: Bgr) -> Hsv {
    let (b, g, r) = (px.b as f32, px.g as f32, px.r as f32);
    let max = b.max(g).max(r);
    let min = b.min(g).min(r);
    let diff = max - min;

    let s = if max > 0.0 { 255.0 * diff / max } else { 0.0 };

    let h_deg = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    let mut h = (h_deg / 2.0).round() as u16;
    if h >= 180 {
        h -= 180;
    }

    Hsv {
        h: h as u8,
        s: s.round().clamp(0.0, 255.0) as u8,
        v: max as u8,
    }
}

/// True iff the hue sits in either red band and saturation/value clear
/// their minimums (strictly greater).
pub fn is_red_hsv(hsv: Hsv, cfg: &ClassifierConfig) -> bool {
    let in_band = cfg.low_hue.contains(hsv.h) || cfg.high_hue.contains(hsv.h);
    in_band && hsv.s > cfg.min_saturation && hsv.v > cfg.min_value
}

/// BGR dominance heuristic: red channel above both others and above a floor.
pub fn is_red_bgr(r: f32, g: f32, b: f32, min_red: u8) -> bool {
    r > g && r > b && r > min_red as f32
}
