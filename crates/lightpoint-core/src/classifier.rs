//! Per-region red classification.
//!
//! The primary signal is the fraction of region pixels whose HSV falls in
//! a red band. A mean-colour BGR dominance test is accepted as a second,
//! independent signal: a missed red light costs more than a false alarm.

use crate::color::{bgr_to_hsv, is_red_bgr, is_red_hsv};
use crate::config::{ClassifierConfig, DetectionConfig};
use crate::error::Error;
use crate::frame::Frame;
use crate::types::{ColorVerdict, MeanColor, Region, RedSignals};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

/// Below this many regions the rayon dispatch costs more than it saves.
pub const PARALLEL_REGION_THRESHOLD: usize = 16;

/// Classify one region of one frame.
pub fn classify(frame: &Frame, region: &Region, cfg: &ClassifierConfig) -> Result<ColorVerdict, Error> {
    if (frame.width, frame.height) != (region.stencil_width, region.stencil_height) {
        return Err(Error::DimensionMismatch {
            frame_width: frame.width,
            frame_height: frame.height,
            stencil_width: region.stencil_width,
            stencil_height: region.stencil_height,
        });
    }
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.data.len() != expected {
        return Err(Error::InvalidFrame {
            expected,
            actual: frame.data.len(),
        });
    }
    let pixels = frame.width as usize * frame.height as usize;
    match region.pixels.iter().max() {
        None => return Err(Error::EmptyRegion(region.id)),
        Some(&index) if index >= pixels => {
            return Err(Error::InvalidRegion {
                id: region.id,
                index,
                pixels,
            })
        }
        Some(_) => {}
    }

    let (mut sum_b, mut sum_g, mut sum_r) = (0u64, 0u64, 0u64);
    for &idx in &region.pixels {
        let px = frame.pixel_at(idx);
        sum_b += px.b as u64;
        sum_g += px.g as u64;
        sum_r += px.r as u64;
    }
    let n = region.pixels.len() as f64;
    let mean_color = MeanColor {
        b: (sum_b as f64 / n) as f32,
        g: (sum_g as f64 / n) as f32,
        r: (sum_r as f64 / n) as f32,
    };

    let stride = cfg.sampling.stride_for(region.pixels.len());
    let mut sampled = 0usize;
    let mut red_pixels = 0usize;
    for &idx in region.pixels.iter().step_by(stride) {
        sampled += 1;
        if is_red_hsv(bgr_to_hsv(frame.pixel_at(idx)), cfg) {
            red_pixels += 1;
        }
    }
    let red_ratio = red_pixels as f32 / sampled as f32;

    let mean_hsv = bgr_to_hsv(mean_color.to_bgr());
    let signals = RedSignals {
        hsv_ratio: red_ratio > cfg.min_red_ratio,
        bgr_mean: cfg.bgr_fallback
            && is_red_bgr(mean_color.r, mean_color.g, mean_color.b, cfg.bgr_min_red),
        mean_hue: cfg.mean_hue_check && is_red_hsv(mean_hsv, cfg),
    };

    tracing::debug!(
        region = region.id,
        sampled,
        stride,
        red_ratio,
        ?signals,
        "region classified"
    );

    Ok(ColorVerdict {
        region_id: region.id,
        is_red: signals.any(),
        red_ratio,
        mean_color,
        mean_hsv,
        sampled,
        red_pixels,
        signals,
    })
}

/// A region that could not be classified in this frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFailure {
    pub region_id: usize,
    #[serde(serialize_with = "display_error")]
    pub error: Error,
}

fn display_error<S: Serializer>(error: &Error, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Verdicts for every region of one frame, in region order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub verdicts: Vec<ColorVerdict>,
    pub failures: Vec<RegionFailure>,
}

impl FrameReport {
    pub fn red_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_red).count()
    }

    pub fn red_ids(&self) -> Vec<usize> {
        self.verdicts
            .iter()
            .filter(|v| v.is_red)
            .map(|v| v.region_id)
            .collect()
    }

    /// True when no region failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Classify every region of a frame.
///
/// A failing region is recorded in [`FrameReport::failures`] and does not
/// stop the others. Verdict order matches region order whether or not the
/// work ran on the rayon pool.
pub fn classify_frame(frame: &Frame, regions: &[Region], cfg: &DetectionConfig) -> FrameReport {
    let classifier = &cfg.classifier;
    let results: Vec<(usize, Result<ColorVerdict, Error>)> =
        if cfg.parallel && regions.len() >= PARALLEL_REGION_THRESHOLD {
            regions
                .par_iter()
                .map(|r| (r.id, classify(frame, r, classifier)))
                .collect()
        } else {
            regions
                .iter()
                .map(|r| (r.id, classify(frame, r, classifier)))
                .collect()
        };

    let mut report = FrameReport::default();
    for (region_id, result) in results {
        match result {
            Ok(verdict) => report.verdicts.push(verdict),
            Err(error) => {
                tracing::warn!(region = region_id, %error, "region classification failed");
                report.failures.push(RegionFailure { region_id, error });
            }
        }
    }
    report
}
