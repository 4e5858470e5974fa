//! Region configuration.
//!
//! A region file names the area to score and where its inputs come from:
//!
//! ```yaml
//! name: alta
//! bounds: { south: 40.56, west: -111.68, north: 40.61, east: -111.60 }
//! zoom: 13
//! tiles:
//!   url_template: "https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}{suffix}.pngraw?access_token={token}"
//! station:
//!   url: "https://wcc.sc.egov.usda.gov/reportGenerator/view_csv/customSingleStationReport/hourly/start_of_period/766:UT:SNTL/{start},{end}/SNWD::value,PREC::value"
//! ```
//!
//! Secrets never live here; the tile token comes from the environment.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use powder_common::{GeoBounds, TileResolution};

pub const DEFAULT_MODEL_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Root of a region YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub bounds: GeoBounds,
    #[serde(default = "default_zoom")]
    pub zoom: u32,
    #[serde(default)]
    pub resolution: TileResolution,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    pub tiles: TileConfig,
    #[serde(default)]
    pub station: Option<StationConfig>,
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_zoom() -> u32 {
    13
}

fn default_lookback_hours() -> u32 {
    24
}

/// Elevation tile endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TileConfig {
    pub url_template: String,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    30
}

/// Snow station report endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub url: String,
}

/// Weather model endpoint. Coordinates default to the region center.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_url")]
    pub base_url: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_url(),
            latitude: None,
            longitude: None,
        }
    }
}

fn default_model_url() -> String {
    DEFAULT_MODEL_URL.to_string()
}

impl RegionConfig {
    /// Load a region configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read region file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse region file: {}", path.display()))?;

        debug!(region = %config.name, path = %path.display(), "Loaded region config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Point the model is queried at.
    pub fn model_point(&self) -> (f64, f64) {
        let lat = self.model.latitude.unwrap_or_else(|| self.bounds.center_lat());
        let lon = self
            .model
            .longitude
            .unwrap_or_else(|| (self.bounds.west() + self.bounds.east()) / 2.0);
        (lat, lon)
    }
}
