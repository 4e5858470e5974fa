//! Overlay rendering for powder scores.
//!
//! - [`ramp`]: score → RGBA color ramp
//! - [`overlay`]: downsampled, color-coded raster with geographic placement
//! - [`png`]: RGBA PNG encoding for export

pub mod overlay;
pub mod png;
pub mod ramp;

pub use overlay::{output_size, rasterize, OverlayImage, MAX_OVERLAY_DIM};
pub use png::{encode_rgba, PngError};
pub use ramp::{Color, ColorRamp, ColorStop, POWDER_RAMP};
