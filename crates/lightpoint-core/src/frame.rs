//! Colour frame type.

use crate::error::Error;
use crate::types::Bgr;

/// A 3-channel 8-bit camera frame, BGR byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Interleaved B, G, R bytes (width * height * 3).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap an interleaved BGR buffer, checking its length.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, Error> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected || expected == 0 {
            return Err(Error::InvalidFrame {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// A frame filled with one colour.
    pub fn filled(width: u32, height: u32, color: Bgr) -> Self {
        let n = width as usize * height as usize;
        let mut data = Vec::with_capacity(n * 3);
        for _ in 0..n {
            data.extend_from_slice(&[color.b, color.g, color.r]);
        }
        Self { data, width, height }
    }

    /// Build from an interleaved RGB buffer (the layout image decoders emit).
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32) -> Result<Self, Error> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected || expected == 0 {
            return Err(Error::InvalidFrame {
                expected,
                actual: rgb.len(),
            });
        }
        let data = rgb
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        Ok(Self { data, width, height })
    }

    /// Colour at a row-major pixel index.
    #[inline]
    pub fn pixel_at(&self, index: usize) -> Bgr {
        let o = index * 3;
        Bgr::new(self.data[o], self.data[o + 1], self.data[o + 2])
    }

    pub fn pixel(&self, x: u32, y: u32) -> Bgr {
        self.pixel_at(y as usize * self.width as usize + x as usize)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Bgr) {
        let o = (y as usize * self.width as usize + x as usize) * 3;
        self.data[o] = color.b;
        self.data[o + 1] = color.g;
        self.data[o + 2] = color.r;
    }
}
