//! Detection thresholds, passed explicitly to every stage.
//!
//! Every struct deserialises with per-field defaults so a partial TOML
//! table only overrides what it names.

use serde::{Deserialize, Serialize};

// --- Fallback constants ---
pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 200;
pub const DEFAULT_MIN_AREA: usize = 10;
pub const DEFAULT_MIN_RED_RATIO: f32 = 0.10;
pub const DEFAULT_MIN_SATURATION: u8 = 50;
pub const DEFAULT_MIN_VALUE: u8 = 50;
pub const DEBUG_MIN_SATURATION: u8 = 30;
pub const DEBUG_MIN_VALUE: u8 = 30;
pub const DEFAULT_BGR_MIN_RED: u8 = 100;

/// Pixel adjacency used when growing stencil components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Four,
    /// Diagonal neighbours join; hand-painted stencils often touch only at corners.
    #[default]
    Eight,
}

/// Inclusive hue interval on the 0–179 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueBand {
    pub min: u8,
    pub max: u8,
}

impl HueBand {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, hue: u8) -> bool {
        hue >= self.min && hue <= self.max
    }
}

/// Which member pixels go through the per-pixel HSV test.
///
/// Sampling walks the region's raster-ordered membership starting at index 0,
/// so the same region size always yields the same stride and the same ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Sampling {
    #[default]
    Exhaustive,
    /// Every `step`-th member pixel.
    Stride { step: usize },
    /// Stride `ceil(area / limit)`, keeping at most `limit` samples.
    MaxSamples { limit: usize },
}

impl Sampling {
    /// Stride to use for a region of `area` pixels. Never zero.
    pub fn stride_for(&self, area: usize) -> usize {
        match *self {
            Sampling::Exhaustive => 1,
            Sampling::Stride { step } => step.max(1),
            Sampling::MaxSamples { limit } if limit == 0 => 1,
            Sampling::MaxSamples { limit } => area.div_ceil(limit).max(1),
        }
    }
}

/// Region extraction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// A stencil pixel is bright iff its intensity is strictly above this.
    pub brightness_threshold: u8,
    /// Components smaller than this many pixels are discarded.
    pub min_area: usize,
    pub connectivity: Connectivity,
    /// Count enclosed dark pixels (and nested blobs) as part of the
    /// surrounding external component.
    pub fill_holes: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
            min_area: DEFAULT_MIN_AREA,
            connectivity: Connectivity::Eight,
            fill_holes: true,
        }
    }
}

/// Colour decision parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Red band just above hue 0.
    pub low_hue: HueBand,
    /// Red band just below the wrap at 180.
    pub high_hue: HueBand,
    pub min_saturation: u8,
    pub min_value: u8,
    /// Region is red when strictly more than this fraction of samples is red.
    pub min_red_ratio: f32,
    pub sampling: Sampling,
    /// Also accept the mean-colour BGR dominance test as a red signal.
    pub bgr_fallback: bool,
    /// Red channel floor for the BGR test.
    pub bgr_min_red: u8,
    /// Also accept a red hue of the mean colour as a signal.
    pub mean_hue_check: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            low_hue: HueBand::new(0, 10),
            high_hue: HueBand::new(170, 180),
            min_saturation: DEFAULT_MIN_SATURATION,
            min_value: DEFAULT_MIN_VALUE,
            min_red_ratio: DEFAULT_MIN_RED_RATIO,
            sampling: Sampling::Exhaustive,
            bgr_fallback: true,
            bgr_min_red: DEFAULT_BGR_MIN_RED,
            mean_hue_check: false,
        }
    }
}

impl ClassifierConfig {
    /// Looser profile used while calibrating exposure: wider hue bands and
    /// lower saturation/value floors.
    pub fn debug() -> Self {
        Self {
            low_hue: HueBand::new(0, 25),
            high_hue: HueBand::new(155, 180),
            min_saturation: DEBUG_MIN_SATURATION,
            min_value: DEBUG_MIN_VALUE,
            ..Self::default()
        }
    }
}

/// Complete parameter bundle for one detection setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub extractor: ExtractorConfig,
    pub classifier: ClassifierConfig,
    /// Classify regions on the rayon pool when there are enough of them.
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            classifier: ClassifierConfig::default(),
            parallel: true,
        }
    }
}

impl DetectionConfig {
    /// Named profiles: `default` and `debug`.
    pub fn profile(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "debug" => Some(Self {
                classifier: ClassifierConfig::debug(),
                ..Self::default()
            }),
            _ => None,
        }
    }

    pub const PROFILES: [&'static str; 2] = ["default", "debug"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_band_inclusive() {
        let band = HueBand::new(0, 10);
        assert!(band.contains(0));
        assert!(band.contains(10));
        assert!(!band.contains(11));
    }

    #[test]
    fn test_stride_policies() {
        assert_eq!(Sampling::Exhaustive.stride_for(1000), 1);
        assert_eq!(Sampling::Stride { step: 3 }.stride_for(1000), 3);
        assert_eq!(Sampling::Stride { step: 0 }.stride_for(1000), 1);
        assert_eq!(Sampling::MaxSamples { limit: 100 }.stride_for(1000), 10);
        assert_eq!(Sampling::MaxSamples { limit: 100 }.stride_for(1001), 11);
        assert_eq!(Sampling::MaxSamples { limit: 100 }.stride_for(50), 1);
        assert_eq!(Sampling::MaxSamples { limit: 0 }.stride_for(50), 1);
    }

    #[test]
    fn test_profiles() {
        let default = DetectionConfig::profile("default").unwrap();
        assert_eq!(default.classifier.min_saturation, 50);
        let debug = DetectionConfig::profile("debug").unwrap();
        assert_eq!(debug.classifier.min_saturation, 30);
        assert_eq!(debug.classifier.min_value, 30);
        assert_eq!(debug.extractor, default.extractor);
        assert!(DetectionConfig::profile("unknown").is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let src = r#"
            [extractor]
            min_area = 25

            [classifier]
            min_red_ratio = 0.2
            sampling = { mode = "stride", step = 2 }
        "#;
        let cfg: DetectionConfig = toml::from_str(src).unwrap();
        assert_eq!(cfg.extractor.min_area, 25);
        assert_eq!(cfg.extractor.brightness_threshold, 200);
        assert_eq!(cfg.extractor.connectivity, Connectivity::Eight);
        assert!((cfg.classifier.min_red_ratio - 0.2).abs() < 1e-6);
        assert_eq!(cfg.classifier.sampling, Sampling::Stride { step: 2 });
        assert_eq!(cfg.classifier.low_hue, HueBand::new(0, 10));
        assert!(cfg.parallel);
    }
}
