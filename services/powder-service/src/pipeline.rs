//! The powder overlay pipeline.
//!
//! Two legs run concurrently:
//! - terrain: tiles → decode → stitch → aspect, behind the terrain cache
//! - weather: snowfall (station, then model) and wind (model)
//!
//! Scoring and rasterization start once both legs are done. A missing
//! terrain or wind input omits the overlay and says why in the status list.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, instrument, warn};

use powder_common::tile::{cell_size_meters, grid_bounds};
use powder_common::{GeoBounds, PowderError, PowderResult, TileRange, TileResolution};
use renderer::{rasterize, OverlayImage, MAX_OVERLAY_DIM};
use scoring::{aggregate_wind, score_grid, DominantWind, ScoreInputs};
use storage::{CacheEntry, CacheKey, CacheOutcome, TerrainCache, TerrainMetadata, TileLayout};
use terrain::{aspect_for_tiles, decode_tile, stitch, PlacedTile, TerrainError};

use crate::sources::TileSource;
use crate::status::StatusMessage;
use crate::weather::{SnowReport, WeatherSource, WeatherWindow};

/// Parameters of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bounds: GeoBounds,
    pub zoom: u32,
    pub resolution: TileResolution,
    pub window: WeatherWindow,
    pub max_concurrent_fetches: usize,
    pub max_overlay_dim: usize,
}

impl PipelineConfig {
    pub fn new(bounds: GeoBounds, zoom: u32, window: WeatherWindow) -> Self {
        Self {
            bounds,
            zoom,
            resolution: TileResolution::default(),
            window,
            max_concurrent_fetches: 8,
            max_overlay_dim: MAX_OVERLAY_DIM,
        }
    }
}

/// Everything the display needs from one run.
#[derive(Debug, Clone)]
pub struct PowderReport {
    /// Absent when terrain or wind was unavailable.
    pub overlay: Option<OverlayImage>,
    pub wind: Option<DominantWind>,
    pub snowfall_in: f64,
    pub precip_in: f64,
    /// Whether terrain came from the cache, when it was available.
    pub terrain: Option<CacheOutcome>,
    pub status: Vec<StatusMessage>,
}

/// Pipeline wired to its collaborators.
pub struct PowderPipeline {
    tiles: Arc<dyn TileSource>,
    station: Option<Arc<dyn WeatherSource>>,
    model: Arc<dyn WeatherSource>,
    cache: Arc<TerrainCache>,
}

impl PowderPipeline {
    pub fn new(
        tiles: Arc<dyn TileSource>,
        model: Arc<dyn WeatherSource>,
        cache: Arc<TerrainCache>,
    ) -> Self {
        Self {
            tiles,
            station: None,
            model,
            cache,
        }
    }

    /// Prefer this source for snowfall, falling back to the model.
    pub fn with_station(mut self, station: Arc<dyn WeatherSource>) -> Self {
        self.station = Some(station);
        self
    }

    pub fn cache(&self) -> &Arc<TerrainCache> {
        &self.cache
    }

    /// Run both legs and render the overlay.
    #[instrument(skip_all, fields(bounds = %config.bounds.cache_key(), zoom = config.zoom))]
    pub async fn run(&self, config: &PipelineConfig) -> PowderReport {
        let (terrain, (snow, wind)) = tokio::join!(self.terrain(config), async {
            tokio::join!(self.snowfall(config), self.dominant_wind(config))
        });

        let mut status = Vec::new();

        let terrain = match terrain {
            Ok((entry, outcome)) => {
                info!(
                    outcome = ?outcome,
                    width = entry.width(),
                    height = entry.height(),
                    "Terrain ready"
                );
                Some((entry, outcome))
            }
            Err(e) => {
                warn!(error = %e, "Terrain unavailable");
                status.push(StatusMessage::error(
                    "terrain",
                    format!("terrain unavailable: {}", e),
                ));
                None
            }
        };

        let (snow, snow_status) = snow;
        status.extend(snow_status);
        if snow.snowfall_in <= 0.0 {
            status.push(StatusMessage::info("snowfall", "no new snow in window"));
        }

        let wind = match wind {
            Ok(wind) => Some(wind),
            Err(e) => {
                warn!(error = %e, "Wind unavailable");
                status.push(StatusMessage::error("wind", format!("wind unavailable: {}", e)));
                None
            }
        };

        let overlay = match (&terrain, &wind) {
            (Some((entry, _)), Some(wind)) => {
                match self.render(entry, wind, &snow, config).await {
                    Ok(image) => Some(image),
                    Err(e) => {
                        status.push(StatusMessage::error(
                            "overlay",
                            format!("overlay failed: {}", e),
                        ));
                        None
                    }
                }
            }
            _ => {
                status.push(StatusMessage::warning(
                    "overlay",
                    "overlay omitted: needs both terrain and wind",
                ));
                None
            }
        };

        PowderReport {
            overlay,
            wind,
            snowfall_in: snow.snowfall_in,
            precip_in: snow.precip_in,
            terrain: terrain.map(|(_, outcome)| outcome),
            status,
        }
    }

    /// Elevation and aspect for the configured region, cached.
    pub async fn terrain(&self, config: &PipelineConfig) -> PowderResult<(CacheEntry, CacheOutcome)> {
        let key = CacheKey::new(&config.bounds, config.zoom, config.resolution);
        self.cache
            .get_or_compute(&key, || self.compute_terrain(config))
            .await
    }

    async fn compute_terrain(&self, config: &PipelineConfig) -> PowderResult<CacheEntry> {
        let range = TileRange::covering(&config.bounds, config.zoom);
        info!(
            tiles = range.len(),
            cols = range.cols(),
            rows = range.rows(),
            "Fetching terrain tiles"
        );

        let payloads: Vec<(usize, usize, Bytes)> = stream::iter(range.tiles())
            .map(|(coord, col, row)| {
                let tiles = self.tiles.clone();
                async move { tiles.fetch_tile(coord).await.map(|bytes| (col, row, bytes)) }
            })
            .buffer_unordered(config.max_concurrent_fetches.max(1))
            .try_collect()
            .await?;

        let zoom = config.zoom;
        let resolution = config.resolution;
        let center_lat = config.bounds.center_lat();

        let (elevation, aspect) = tokio::task::spawn_blocking(move || -> PowderResult<_> {
            let placed = payloads
                .into_iter()
                .map(|(col, row, bytes)| -> Result<PlacedTile, TerrainError> {
                    Ok(PlacedTile::new(col, row, decode_tile(&bytes, resolution)?))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let elevation = stitch(placed, range.cols(), range.rows())?;
            let aspect = aspect_for_tiles(&elevation, zoom, center_lat, resolution);
            Ok((elevation, aspect))
        })
        .await
        .map_err(|e| PowderError::Internal(format!("terrain task failed: {}", e)))??;

        let metadata = TerrainMetadata {
            zoom,
            resolution,
            cell_size_m: cell_size_meters(zoom, center_lat, resolution),
            layout: TileLayout {
                range,
                tile_size: resolution.tile_size(),
            },
            footprint: grid_bounds(&config.bounds, zoom),
            created_at: Utc::now(),
        };

        Ok(CacheEntry::new(elevation, aspect, metadata))
    }

    /// Station snowfall when available, else model snowfall, else none.
    async fn snowfall(&self, config: &PipelineConfig) -> (SnowReport, Vec<StatusMessage>) {
        let mut status = Vec::new();

        if let Some(station) = &self.station {
            match station.snowfall(&config.window).await {
                Ok(report) => return (report, status),
                Err(e) => {
                    warn!(source = station.name(), error = %e, "Station snowfall unavailable");
                    status.push(StatusMessage::warning(
                        "snowfall",
                        format!("snowfall unavailable from station ({}); using model", e),
                    ));
                }
            }
        }

        match self.model.snowfall(&config.window).await {
            Ok(report) => (report, status),
            Err(e) => {
                warn!(source = self.model.name(), error = %e, "Model snowfall unavailable");
                status.push(StatusMessage::warning(
                    "snowfall",
                    format!("snowfall unavailable: {}; assuming none", e),
                ));
                (SnowReport::default(), status)
            }
        }
    }

    async fn dominant_wind(&self, config: &PipelineConfig) -> PowderResult<DominantWind> {
        let series = self.model.wind(&config.window).await?;
        let samples = series.samples()?;
        Ok(aggregate_wind(&samples)?)
    }

    async fn render(
        &self,
        entry: &CacheEntry,
        wind: &DominantWind,
        snow: &SnowReport,
        config: &PipelineConfig,
    ) -> PowderResult<OverlayImage> {
        let aspect = entry.aspect.clone();
        let footprint = entry.metadata.footprint;
        let max_dim = config.max_overlay_dim;
        let inputs = ScoreInputs {
            wind_from_deg: wind.direction_deg,
            snowfall_in: snow.snowfall_in,
            precip_in: snow.precip_in,
            avg_wind_mph: wind.avg_speed_mph,
        };

        tokio::task::spawn_blocking(move || {
            let scores = score_grid(&aspect, &inputs);
            rasterize(&scores, footprint, max_dim)
        })
        .await
        .map_err(|e| PowderError::Internal(format!("render task failed: {}", e)))
    }
}
