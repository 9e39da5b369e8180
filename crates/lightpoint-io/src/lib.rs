//! lightpoint-io — Image-file collaborators for the detection core.
//!
//! Decodes mask and frame images with the `image` crate and exposes frame
//! acquisition as a [`FrameSource`] capability, so the core never touches
//! files or devices.

pub mod loader;
pub mod source;

pub use loader::{load_frame, load_stencil, SourceError};
pub use source::{open_first_available, FrameSource, ImageSequenceSource, SourceFactory, StillImageSource};
