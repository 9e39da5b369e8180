//! Connected-component extraction of stencil light points.

use crate::config::{Connectivity, ExtractorConfig};
use crate::error::Error;
use crate::stencil::StencilImage;
use crate::types::{BoundingBox, Region};

const NEIGHBORS_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const NEIGHBORS_8: [(i32, i32); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

fn offsets(connectivity: Connectivity) -> &'static [(i32, i32)] {
    match connectivity {
        Connectivity::Four => &NEIGHBORS_4,
        Connectivity::Eight => &NEIGHBORS_8,
    }
}

/// The background adjacency that pairs with a foreground adjacency, so that
/// an enclosing boundary actually separates inside from outside.
fn complement(connectivity: Connectivity) -> Connectivity {
    match connectivity {
        Connectivity::Four => Connectivity::Eight,
        Connectivity::Eight => Connectivity::Four,
    }
}

/// Extract the external bright components of a stencil.
///
/// Regions come back in raster-scan discovery order (by their top-most,
/// then left-most pixel) with ids `0..n`, so repeated calls on the same
/// stencil return identical lists. Fails with [`Error::EmptyMask`] when no
/// component reaches `min_area`.
pub fn extract_regions(stencil: &StencilImage, cfg: &ExtractorConfig) -> Result<Vec<Region>, Error> {
    let (width, height) = stencil.dimensions();
    let w = width as usize;
    let h = height as usize;

    let mut member: Vec<bool> = stencil
        .data()
        .iter()
        .map(|&p| p > cfg.brightness_threshold)
        .collect();

    if cfg.fill_holes {
        let outside = reachable_from_border(&member, w, h, complement(cfg.connectivity));
        for (m, out) in member.iter_mut().zip(outside) {
            *m = !out;
        }
    }

    let neighbors = offsets(cfg.connectivity);
    let mut visited = vec![false; w * h];
    let mut stack = Vec::new();
    let mut regions = Vec::new();
    let mut discarded = 0usize;

    for seed in 0..w * h {
        if !member[seed] || visited[seed] {
            continue;
        }

        visited[seed] = true;
        stack.push(seed);
        let mut pixels = Vec::new();

        while let Some(idx) = stack.pop() {
            pixels.push(idx);
            let x = (idx % w) as i32;
            let y = (idx / w) as i32;
            for &(dx, dy) in neighbors {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if member[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }

        if pixels.len() < cfg.min_area {
            discarded += 1;
            continue;
        }

        pixels.sort_unstable();
        regions.push(build_region(regions.len(), pixels, width, height));
    }

    tracing::debug!(
        kept = regions.len(),
        discarded,
        threshold = cfg.brightness_threshold,
        min_area = cfg.min_area,
        "stencil regions extracted"
    );

    if regions.is_empty() {
        return Err(Error::EmptyMask {
            threshold: cfg.brightness_threshold,
            min_area: cfg.min_area,
        });
    }

    Ok(regions)
}

/// Mark non-member pixels connected to the image border.
fn reachable_from_border(member: &[bool], w: usize, h: usize, connectivity: Connectivity) -> Vec<bool> {
    let neighbors = offsets(connectivity);
    let mut outside = vec![false; w * h];
    let mut stack = Vec::new();

    let border = (0..w)
        .flat_map(|x| [x, (h - 1) * w + x])
        .chain((0..h).flat_map(|y| [y * w, y * w + w - 1]));
    for idx in border {
        if !member[idx] && !outside[idx] {
            outside[idx] = true;
            stack.push(idx);
        }
    }

    while let Some(idx) = stack.pop() {
        let x = (idx % w) as i32;
        let y = (idx / w) as i32;
        for &(dx, dy) in neighbors {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let n = ny as usize * w + nx as usize;
            if !member[n] && !outside[n] {
                outside[n] = true;
                stack.push(n);
            }
        }
    }

    outside
}

fn build_region(id: usize, pixels: Vec<usize>, width: u32, height: u32) -> Region {
    let w = width as usize;
    let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
    let (mut max_x, mut max_y) = (0usize, 0usize);
    let (mut sum_x, mut sum_y) = (0f64, 0f64);

    for &idx in &pixels {
        let (x, y) = (idx % w, idx / w);
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        sum_x += x as f64;
        sum_y += y as f64;
    }

    let area = pixels.len();
    Region {
        id,
        area,
        bounds: BoundingBox {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        },
        centroid: ((sum_x / area as f64) as f32, (sum_y / area as f64) as f32),
        pixels,
        stencil_width: width,
        stencil_height: height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn scenario_mask() -> StencilImage {
        let mut s = StencilImage::blank(30, 20).unwrap();
        s.fill_rect(2, 2, 5, 5, 255);
        s.fill_rect(20, 3, 5, 5, 255);
        s.fill_rect(10, 15, 2, 2, 255);
        s
    }

    fn ring(size: u32, thickness: u32) -> StencilImage {
        let mut s = StencilImage::blank(size + 4, size + 4).unwrap();
        s.fill_rect(2, 2, size, size, 255);
        s.fill_rect(2 + thickness, 2 + thickness, size - 2 * thickness, size - 2 * thickness, 0);
        s
    }

    #[test]
    fn test_two_squares_survive_small_one_dropped() {
        let regions = extract_regions(&scenario_mask(), &ExtractorConfig::default()).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 25);
        assert_eq!(regions[1].area, 25);
    }

    #[test]
    fn test_ids_follow_raster_order() {
        let regions = extract_regions(&scenario_mask(), &ExtractorConfig::default()).unwrap();
        assert_eq!(regions[0].id, 0);
        assert_eq!(regions[0].bounds, BoundingBox { x: 2, y: 2, width: 5, height: 5 });
        assert_eq!(regions[1].id, 1);
        assert_eq!(regions[1].bounds, BoundingBox { x: 20, y: 3, width: 5, height: 5 });
        assert_eq!(regions[0].centroid, (4.0, 4.0));
    }

    #[test]
    fn test_top_most_pixel_decides_order() {
        // Region B starts further right but one row higher than A
        let mut s = StencilImage::blank(30, 10).unwrap();
        s.fill_rect(1, 3, 4, 4, 255);
        s.fill_rect(20, 2, 4, 4, 255);
        let regions = extract_regions(&s, &ExtractorConfig::default()).unwrap();
        assert_eq!(regions[0].bounds.x, 20);
        assert_eq!(regions[1].bounds.x, 1);
    }

    #[test]
    fn test_deterministic() {
        let s = scenario_mask();
        let a = extract_regions(&s, &ExtractorConfig::default()).unwrap();
        let b = extract_regions(&s, &ExtractorConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_area_invariant_and_disjoint() {
        let mut s = StencilImage::blank(40, 40).unwrap();
        // scattered blobs of assorted sizes, some below the threshold
        for i in 0..8u32 {
            let size = 1 + i;
            s.fill_rect(i * 5, (i * 7) % 33, size, size, 230);
        }
        let cfg = ExtractorConfig::default();
        let regions = extract_regions(&s, &cfg).unwrap();
        let mut seen = HashSet::new();
        for r in &regions {
            assert!(r.area >= cfg.min_area);
            assert_eq!(r.area, r.pixels.len());
            for &p in &r.pixels {
                assert!(seen.insert(p), "pixel {p} in two regions");
            }
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut s = StencilImage::blank(10, 10).unwrap();
        s.fill_rect(0, 0, 5, 5, 200);
        let err = extract_regions(&s, &ExtractorConfig::default()).unwrap_err();
        assert_eq!(err, Error::EmptyMask { threshold: 200, min_area: 10 });
    }

    #[test]
    fn test_empty_mask_error() {
        let s = StencilImage::blank(8, 8).unwrap();
        assert!(matches!(
            extract_regions(&s, &ExtractorConfig::default()),
            Err(Error::EmptyMask { .. })
        ));
    }

    #[test]
    fn test_holes_filled_by_default() {
        // 7x7 ring, 1px thick: 24 bright + 25 enclosed
        let regions = extract_regions(&ring(7, 1), &ExtractorConfig::default()).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 49);
    }

    #[test]
    fn test_holes_kept_when_disabled() {
        let cfg = ExtractorConfig { fill_holes: false, ..Default::default() };
        let regions = extract_regions(&ring(7, 1), &cfg).unwrap();
        assert_eq!(regions[0].area, 24);
    }

    #[test]
    fn test_nested_blob_absorbed_by_outer() {
        let mut s = ring(11, 1);
        // 4x4 island inside the hole, big enough to survive on its own
        s.fill_rect(6, 6, 4, 4, 255);
        let regions = extract_regions(&s, &ExtractorConfig::default()).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 121);

        let cfg = ExtractorConfig { fill_holes: false, ..Default::default() };
        let regions = extract_regions(&s, &cfg).unwrap();
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_diagonal_adjacency() {
        // Two 3x3 squares touching only at a corner
        let mut s = StencilImage::blank(10, 10).unwrap();
        s.fill_rect(1, 1, 3, 3, 255);
        s.fill_rect(4, 4, 3, 3, 255);

        let cfg = ExtractorConfig { min_area: 5, ..Default::default() };
        assert_eq!(extract_regions(&s, &cfg).unwrap().len(), 1);

        let cfg = ExtractorConfig {
            min_area: 5,
            connectivity: Connectivity::Four,
            ..Default::default()
        };
        let regions = extract_regions(&s, &cfg).unwrap();
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.area == 9));
    }

    #[test]
    fn test_region_touching_border() {
        let mut s = StencilImage::blank(6, 6).unwrap();
        s.fill_rect(0, 0, 6, 2, 255);
        let regions = extract_regions(&s, &ExtractorConfig::default()).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 12);
    }
}
