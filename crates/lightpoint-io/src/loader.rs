//! Mask and frame decoding.

use image::{GrayImage, RgbImage};
use lightpoint_core::{Frame, StencilImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image is empty: {0}")]
    Empty(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] lightpoint_core::Error),
    #[error("no frame source available ({tried} tried)")]
    NoSourceAvailable { tried: usize },
}

impl From<SourceError> for lightpoint_core::Error {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Core(e) => e,
            other => lightpoint_core::Error::Load(other.to_string()),
        }
    }
}

fn open_image(path: &Path) -> Result<image::DynamicImage, SourceError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(SourceError::NotFound(display));
    }
    let img = image::open(path).map_err(|source| SourceError::Decode {
        path: display.clone(),
        source,
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(SourceError::Empty(display));
    }
    Ok(img)
}

/// Decode a mask file to an 8-bit single-channel stencil.
///
/// Colour masks are reduced to luma; alpha is dropped.
pub fn load_stencil(path: impl AsRef<Path>) -> Result<StencilImage, SourceError> {
    let path = path.as_ref();
    let luma = open_image(path)?.to_luma8();
    let stencil = stencil_from_luma(&luma)?;
    tracing::info!(
        path = %path.display(),
        width = stencil.width(),
        height = stencil.height(),
        "mask loaded"
    );
    Ok(stencil)
}

/// Decode an image file into a BGR frame.
pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame, SourceError> {
    let path = path.as_ref();
    let rgb = open_image(path)?.to_rgb8();
    let frame = frame_from_rgb(&rgb)?;
    tracing::debug!(path = %path.display(), width = frame.width, height = frame.height, "frame loaded");
    Ok(frame)
}

pub fn stencil_from_luma(img: &GrayImage) -> Result<StencilImage, SourceError> {
    Ok(StencilImage::new(img.as_raw().clone(), img.width(), img.height())?)
}

pub fn frame_from_rgb(img: &RgbImage) -> Result<Frame, SourceError> {
    Ok(Frame::from_rgb(img.as_raw(), img.width(), img.height())?)
}
