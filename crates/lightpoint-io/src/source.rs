//! Frame sources.
//!
//! Acquisition cadence, frame dropping and backend fallback all live here,
//! outside the detection core. The core only ever sees finished frames.

use crate::loader::{load_frame, SourceError};
use lightpoint_core::Frame;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Anything that hands out BGR frames one at a time.
pub trait FrameSource {
    fn name(&self) -> &str;

    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;
}

/// Replays a single decoded image, `repeat` times or forever.
pub struct StillImageSource {
    name: String,
    frame: Frame,
    remaining: Option<usize>,
}

impl StillImageSource {
    pub fn open(path: impl AsRef<Path>, repeat: Option<usize>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let frame = load_frame(path)?;
        Ok(Self::from_frame(format!("still:{}", path.display()), frame, repeat))
    }

    pub fn from_frame(name: impl Into<String>, frame: Frame, repeat: Option<usize>) -> Self {
        Self {
            name: name.into(),
            frame,
            remaining: repeat,
        }
    }
}

impl FrameSource for StillImageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match &mut self.remaining {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.frame.clone()))
            }
            None => Ok(Some(self.frame.clone())),
        }
    }
}

/// Walks the image files of a directory in file-name order.
pub struct ImageSequenceSource {
    name: String,
    pending: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SourceError::NotFound(dir.display().to_string()));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(SourceError::Empty(dir.display().to_string()));
        }

        tracing::info!(dir = %dir.display(), frames = paths.len(), "image sequence opened");
        Ok(Self {
            name: format!("sequence:{}", dir.display()),
            pending: paths.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match self.pending.pop_front() {
            Some(path) => load_frame(&path).map(Some),
            None => Ok(None),
        }
    }
}

/// Deferred constructor for a candidate source.
pub type SourceFactory = Box<dyn FnOnce() -> Result<Box<dyn FrameSource>, SourceError>>;

/// Try candidate sources in order and keep the first one that produces a
/// frame. Returns that source together with the frame it produced.
pub fn open_first_available(
    candidates: Vec<SourceFactory>,
) -> Result<(Box<dyn FrameSource>, Frame), SourceError> {
    let tried = candidates.len();
    for (i, factory) in candidates.into_iter().enumerate() {
        let mut source = match factory() {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(candidate = i, error = %e, "frame source unavailable");
                continue;
            }
        };
        match source.next_frame() {
            Ok(Some(frame)) => {
                tracing::info!(
                    source = source.name(),
                    width = frame.width,
                    height = frame.height,
                    "frame source selected"
                );
                return Ok((source, frame));
            }
            Ok(None) => {
                tracing::warn!(source = source.name(), "frame source produced no frames");
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "frame source failed first read");
            }
        }
    }
    Err(SourceError::NoSourceAvailable { tried })
}
