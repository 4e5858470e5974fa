//! Powder overlay service.
//!
//! Wires the terrain, storage, scoring and renderer crates to their
//! collaborators:
//! - [`sources`]: elevation tile fetching
//! - [`weather`]: station and model weather clients
//! - [`pipeline`]: the concurrent terrain + weather pipeline
//! - [`status`]: per-leg availability messages
//! - [`config`]: region configuration files

pub mod config;
pub mod pipeline;
pub mod sources;
pub mod status;
pub mod weather;

pub use pipeline::{PipelineConfig, PowderPipeline, PowderReport};
pub use sources::{HttpTileSource, TileSource};
pub use status::{StatusLevel, StatusMessage};
pub use weather::{ModelSource, SnowReport, StationSource, WeatherSource, WeatherWindow};
