//! lightpoint-core — Mask-guided light-point segmentation and red classification.
//!
//! A stencil marks candidate light points on a camera frame. The core
//! normalises the stencil to the frame resolution, extracts its connected
//! bright regions once, then decides per frame whether each region is red.

pub mod classifier;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod monitor;
pub mod region;
pub mod stencil;
pub mod types;

pub use classifier::{classify, classify_frame, FrameReport, RegionFailure};
pub use config::{ClassifierConfig, Connectivity, DetectionConfig, ExtractorConfig, HueBand, Sampling};
pub use error::Error;
pub use frame::Frame;
pub use monitor::{CountChange, RedCountMonitor};
pub use region::extract_regions;
pub use stencil::{normalize, MaskRegistry, StencilImage};
pub use types::{Bgr, BoundingBox, ColorVerdict, Hsv, MeanColor, RedSignals, Region};
