//! Stencil images and the mask registry.
//!
//! A stencil is binary-like (bright = light point, dark = background), so
//! every resize here is nearest-neighbour: interpolation would smear edges
//! into grey ramps and shift region areas across the extraction threshold.

use crate::config::ExtractorConfig;
use crate::error::Error;
use crate::region::extract_regions;
use crate::types::Region;

/// Single-channel 8-bit stencil, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StencilImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl StencilImage {
    /// Wrap a decoded luma buffer. Empty buffers, zero dimensions and
    /// length mismatches are load failures.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, Error> {
        if width == 0 || height == 0 || data.is_empty() {
            return Err(Error::Load(format!("empty stencil ({width}x{height})")));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::Load(format!(
                "stencil buffer holds {} bytes, {width}x{height} needs {expected}",
                data.len()
            )));
        }
        Ok(Self { data, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Number of pixels strictly brighter than `threshold`.
    pub fn bright_count(&self, threshold: u8) -> usize {
        self.data.iter().filter(|&&p| p > threshold).count()
    }
}

#[cfg(test)]
impl StencilImage {
    /// An all-dark stencil.
    pub(crate) fn blank(width: u32, height: u32) -> Result<Self, Error> {
        Self::new(vec![0; width as usize * height as usize], width, height)
    }

    /// Paint an axis-aligned rectangle, clipped to the stencil.
    pub(crate) fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, value: u8) {
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        for row in y.min(self.height)..y1 {
            let base = row as usize * self.width as usize;
            for col in x.min(self.width)..x1 {
                self.data[base + col as usize] = value;
            }
        }
    }
}

/// Resize a stencil to the target frame resolution.
///
/// Returns the input untouched when it already has the target size.
pub fn normalize(raw: StencilImage, target_width: u32, target_height: u32) -> Result<StencilImage, Error> {
    if target_width == 0 || target_height == 0 {
        return Err(Error::Dimension {
            width: target_width,
            height: target_height,
        });
    }
    if raw.dimensions() == (target_width, target_height) {
        return Ok(raw);
    }

    let (sw, sh) = (raw.width as u64, raw.height as u64);
    let (tw, th) = (target_width as u64, target_height as u64);

    let src_cols: Vec<usize> = (0..tw).map(|x| ((x * sw) / tw) as usize).collect();
    let mut data = Vec::with_capacity((tw * th) as usize);
    for y in 0..th {
        let src_row = ((y * sh) / th) as usize * raw.width as usize;
        data.extend(src_cols.iter().map(|&sx| raw.data[src_row + sx]));
    }

    tracing::debug!(
        from = ?raw.dimensions(),
        to = ?(target_width, target_height),
        "stencil resized (nearest)"
    );

    StencilImage::new(data, target_width, target_height)
}

/// Owns one stencil, its normalised form, and the region list derived from it.
///
/// Normalisation and extraction run once per target resolution; frames of
/// that resolution then reuse the cached regions.
#[derive(Debug, Clone)]
pub struct MaskRegistry {
    raw: StencilImage,
    stencil: StencilImage,
    extractor: ExtractorConfig,
    regions: Vec<Region>,
}

impl MaskRegistry {
    pub fn new(
        raw: StencilImage,
        width: u32,
        height: u32,
        extractor: ExtractorConfig,
    ) -> Result<Self, Error> {
        let stencil = normalize(raw.clone(), width, height)?;
        let regions = extract_regions(&stencil, &extractor)?;
        tracing::info!(
            source = ?raw.dimensions(),
            target = ?stencil.dimensions(),
            bright = stencil.bright_count(extractor.brightness_threshold),
            regions = regions.len(),
            "mask registered"
        );
        Ok(Self {
            raw,
            stencil,
            extractor,
            regions,
        })
    }

    pub fn stencil(&self) -> &StencilImage {
        &self.stencil
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn extractor(&self) -> &ExtractorConfig {
        &self.extractor
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.stencil.dimensions()
    }

    /// Re-normalise for a new frame resolution.
    ///
    /// Returns `Ok(false)` when already aligned. On error the registry keeps
    /// its previous stencil and regions.
    pub fn align_to(&mut self, width: u32, height: u32) -> Result<bool, Error> {
        if self.dimensions() == (width, height) {
            return Ok(false);
        }
        let stencil = normalize(self.raw.clone(), width, height)?;
        let regions = extract_regions(&stencil, &self.extractor)?;
        tracing::info!(
            from = ?self.dimensions(),
            to = ?(width, height),
            regions = regions.len(),
            "mask realigned to frame resolution"
        );
        self.stencil = stencil;
        self.regions = regions;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> StencilImage {
        let data = (0..w * h)
            .map(|i| if (i % w + i / w) % 2 == 0 { 255 } else { 0 })
            .collect();
        StencilImage::new(data, w, h).unwrap()
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(StencilImage::new(Vec::new(), 0, 0), Err(Error::Load(_))));
        assert!(matches!(StencilImage::new(vec![0; 4], 0, 4), Err(Error::Load(_))));
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        assert!(matches!(StencilImage::new(vec![0; 5], 2, 2), Err(Error::Load(_))));
    }

    #[test]
    fn test_normalize_zero_width_fails() {
        let err = normalize(checker(4, 4), 0, 4).unwrap_err();
        assert_eq!(err, Error::Dimension { width: 0, height: 4 });
    }

    #[test]
    fn test_normalize_zero_height_fails() {
        assert!(matches!(normalize(checker(4, 4), 4, 0), Err(Error::Dimension { .. })));
    }

    #[test]
    fn test_normalize_noop_when_sized() {
        let s = checker(5, 3);
        let out = normalize(s.clone(), 5, 3).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize(checker(7, 5), 16, 9).unwrap();
        let twice = normalize(once.clone(), 16, 9).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_upscale_nearest() {
        // 2x2 → 4x4 replicates each source pixel into a 2x2 block
        let s = StencilImage::new(vec![10, 20, 30, 40], 2, 2).unwrap();
        let out = normalize(s, 4, 4).unwrap();
        assert_eq!(
            out.data(),
            &[10, 10, 20, 20, 10, 10, 20, 20, 30, 30, 40, 40, 30, 30, 40, 40]
        );
    }

    #[test]
    fn test_normalize_downscale_keeps_binary_values() {
        let out = normalize(checker(64, 48), 13, 7).unwrap();
        assert_eq!(out.dimensions(), (13, 7));
        assert!(out.data().iter().all(|&p| p == 0 || p == 255));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut s = StencilImage::blank(4, 4).unwrap();
        s.fill_rect(2, 2, 10, 10, 255);
        assert_eq!(s.bright_count(200), 4);
        assert_eq!(s.get(3, 3), 255);
        assert_eq!(s.get(1, 1), 0);
    }

    fn two_blob_mask() -> StencilImage {
        let mut s = StencilImage::blank(20, 10).unwrap();
        s.fill_rect(1, 1, 4, 4, 255);
        s.fill_rect(12, 4, 5, 5, 255);
        s
    }

    #[test]
    fn test_registry_extracts_once() {
        let reg = MaskRegistry::new(two_blob_mask(), 20, 10, ExtractorConfig::default()).unwrap();
        assert_eq!(reg.dimensions(), (20, 10));
        assert_eq!(reg.regions().len(), 2);
    }

    #[test]
    fn test_registry_realign() {
        let mut reg = MaskRegistry::new(two_blob_mask(), 20, 10, ExtractorConfig::default()).unwrap();
        assert!(!reg.align_to(20, 10).unwrap());
        assert!(reg.align_to(40, 20).unwrap());
        assert_eq!(reg.dimensions(), (40, 20));
        assert_eq!(reg.regions().len(), 2);
        assert!(reg.regions().iter().all(|r| r.stencil_width == 40));
        assert_eq!(reg.regions()[0].area, 64);
    }

    #[test]
    fn test_registry_failed_realign_keeps_state() {
        let mut reg = MaskRegistry::new(two_blob_mask(), 20, 10, ExtractorConfig::default()).unwrap();
        assert!(reg.align_to(0, 10).is_err());
        assert_eq!(reg.dimensions(), (20, 10));
        // Downscaling to 2x1 shrinks every blob below min_area
        assert!(matches!(reg.align_to(2, 1), Err(Error::EmptyMask { .. })));
        assert_eq!(reg.regions().len(), 2);
    }
}
