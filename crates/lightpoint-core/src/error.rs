use thiserror::Error;

/// Failures reported by the detection core.
///
/// None of these are retried internally; each one asks the caller to fix an
/// input (reload the mask, resize the frame, recalibrate) and call again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("mask could not be loaded: {0}")]
    Load(String),
    #[error("invalid target size {width}x{height}: both dimensions must be positive")]
    Dimension { width: u32, height: u32 },
    #[error("no light-point regions survived filtering (threshold {threshold}, min area {min_area})")]
    EmptyMask { threshold: u8, min_area: usize },
    #[error(
        "frame is {frame_width}x{frame_height} but regions were built from a \
         {stencil_width}x{stencil_height} stencil; re-run the mask registry"
    )]
    DimensionMismatch {
        frame_width: u32,
        frame_height: u32,
        stencil_width: u32,
        stencil_height: u32,
    },
    #[error("region {0} has no pixels to sample")]
    EmptyRegion(usize),
    #[error("region {id} references pixel {index} outside a {pixels}-pixel frame")]
    InvalidRegion { id: usize, index: usize, pixels: usize },
    #[error("invalid frame buffer: expected {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },
}
