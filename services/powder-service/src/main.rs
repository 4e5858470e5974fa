//! Powder overlay CLI
//!
//! Scores a region for wind-loaded fresh snow and writes `overlay.png` plus an
//! `overlay.json` sidecar describing its placement and inputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use powder_common::{GeoBounds, GridFootprint, TileResolution};
use powder_service::config::{RegionConfig, DEFAULT_MODEL_URL};
use powder_service::{
    HttpTileSource, ModelSource, PipelineConfig, PowderPipeline, PowderReport, StationSource,
    StatusLevel, StatusMessage, WeatherWindow,
};
use renderer::{encode_rgba, MAX_OVERLAY_DIM};
use scoring::DominantWind;
use storage::{CacheOutcome, FileStore, MemoryStore, TerrainCache, TerrainStore};

/// Powder overlay generator
#[derive(Parser, Debug)]
#[command(name = "powder-overlay")]
#[command(about = "Score terrain for wind-loaded powder and render a map overlay")]
struct Args {
    /// Region YAML file
    #[arg(short, long, env = "POWDER_REGION")]
    region: Option<PathBuf>,

    /// Bounds as "south,west,north,east" (overrides the region file)
    #[arg(long, allow_hyphen_values = true)]
    bounds: Option<String>,

    /// Tile zoom level
    #[arg(short, long)]
    zoom: Option<u32>,

    /// Tile resolution: 1x or 2x
    #[arg(long)]
    resolution: Option<TileResolution>,

    /// Hours of weather ending at --end
    #[arg(long)]
    lookback_hours: Option<u32>,

    /// End of the weather window, RFC 3339 (default: now)
    #[arg(long)]
    end: Option<String>,

    /// Elevation tile URL template
    #[arg(long, env = "POWDER_TILE_URL")]
    tile_url: Option<String>,

    /// Tile access token
    #[arg(long, env = "POWDER_TILE_TOKEN", hide_env_values = true)]
    tile_token: Option<String>,

    /// Station report URL template
    #[arg(long, env = "POWDER_STATION_URL")]
    station_url: Option<String>,

    /// Weather model endpoint
    #[arg(long, env = "POWDER_MODEL_URL")]
    model_url: Option<String>,

    /// Terrain cache directory
    #[arg(long, default_value = "./cache", env = "POWDER_CACHE_DIR")]
    cache_dir: PathBuf,

    /// Keep terrain in memory only
    #[arg(long)]
    memory_cache: bool,

    /// Where overlay.png and overlay.json are written
    #[arg(short, long, default_value = ".", env = "POWDER_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Concurrent tile fetches
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long, env = "POWDER_JSON_LOGS")]
    json_logs: bool,
}

/// Everything needed for one run after merging the region file and flags.
struct Settings {
    name: String,
    bounds: GeoBounds,
    zoom: u32,
    resolution: TileResolution,
    lookback_hours: u32,
    tile_url: String,
    tile_timeout: Duration,
    max_concurrent: usize,
    station_url: Option<String>,
    model_url: String,
    model_point: (f64, f64),
}

impl Settings {
    fn resolve(args: &Args) -> Result<Self> {
        let region = args
            .region
            .as_deref()
            .map(RegionConfig::load)
            .transpose()?;

        let bounds = match (&args.bounds, &region) {
            (Some(s), _) => GeoBounds::from_csv(s).context("Invalid --bounds")?,
            (None, Some(r)) => r.bounds,
            (None, None) => bail!("either --region or --bounds is required"),
        };

        let tile_url = match (&args.tile_url, &region) {
            (Some(url), _) => url.clone(),
            (None, Some(r)) => r.tiles.url_template.clone(),
            (None, None) => bail!("either --region or --tile-url is required"),
        };

        let center = (
            bounds.center_lat(),
            (bounds.west() + bounds.east()) / 2.0,
        );

        Ok(match region {
            Some(r) => Self {
                name: r.name.clone(),
                bounds,
                zoom: args.zoom.unwrap_or(r.zoom),
                resolution: args.resolution.unwrap_or(r.resolution),
                lookback_hours: args.lookback_hours.unwrap_or(r.lookback_hours),
                tile_url,
                tile_timeout: Duration::from_secs(r.tiles.timeout_secs),
                max_concurrent: args.max_concurrent.unwrap_or(r.tiles.max_concurrent_fetches),
                station_url: args
                    .station_url
                    .clone()
                    .or_else(|| r.station.as_ref().map(|s| s.url.clone())),
                model_url: args.model_url.clone().unwrap_or_else(|| r.model.base_url.clone()),
                model_point: if args.bounds.is_some() {
                    center
                } else {
                    r.model_point()
                },
            },
            None => Self {
                name: "custom".to_string(),
                bounds,
                zoom: args.zoom.unwrap_or(13),
                resolution: args.resolution.unwrap_or_default(),
                lookback_hours: args.lookback_hours.unwrap_or(24),
                tile_url,
                tile_timeout: Duration::from_secs(30),
                max_concurrent: args.max_concurrent.unwrap_or(8),
                station_url: args.station_url.clone(),
                model_url: args
                    .model_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MODEL_URL.to_string()),
                model_point: center,
            },
        })
    }
}

/// Contents of overlay.json.
#[derive(Debug, Serialize)]
struct Sidecar<'a> {
    region: &'a str,
    generated_at: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    /// Geographic rectangle the image is stretched over.
    placement: Option<GridFootprint>,
    width: Option<usize>,
    height: Option<usize>,
    wind: Option<&'a DominantWind>,
    snowfall_in: f64,
    precip_in: f64,
    terrain_cached: Option<bool>,
    status: &'a [StatusMessage],
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    let settings = Settings::resolve(&args)?;
    let end = match &args.end {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --end timestamp: {}", s))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let window = WeatherWindow::last_hours(end, settings.lookback_hours);

    info!(
        region = %settings.name,
        bounds = %settings.bounds.cache_key(),
        zoom = settings.zoom,
        resolution = ?settings.resolution,
        window_start = %window.start,
        window_end = %window.end,
        "Starting powder overlay run"
    );

    let store: Arc<dyn TerrainStore> = if args.memory_cache {
        Arc::new(MemoryStore::default())
    } else {
        Arc::new(FileStore::new(&args.cache_dir))
    };
    info!(store = store.name(), "Terrain store ready");
    let cache = Arc::new(TerrainCache::new(store));

    let tiles = Arc::new(
        HttpTileSource::new(
            &settings.tile_url,
            args.tile_token.clone(),
            settings.resolution,
            settings.tile_timeout,
        )
        .context("Failed to create tile source")?,
    );

    let (lat, lon) = settings.model_point;
    let model = Arc::new(
        ModelSource::new(&settings.model_url, lat, lon, Duration::from_secs(30))
            .context("Failed to create model source")?,
    );

    let mut pipeline = PowderPipeline::new(tiles, model, cache.clone());
    if let Some(url) = &settings.station_url {
        let station = StationSource::new(url, Duration::from_secs(30))
            .context("Failed to create station source")?;
        pipeline = pipeline.with_station(Arc::new(station));
    }

    let config = PipelineConfig {
        bounds: settings.bounds,
        zoom: settings.zoom,
        resolution: settings.resolution,
        window,
        max_concurrent_fetches: settings.max_concurrent,
        max_overlay_dim: MAX_OVERLAY_DIM,
    };

    let report = pipeline.run(&config).await;

    for message in &report.status {
        match message.level {
            StatusLevel::Info => info!(input = message.input, "{}", message.message),
            StatusLevel::Warning => warn!(input = message.input, "{}", message.message),
            StatusLevel::Error => error!(input = message.input, "{}", message.message),
        }
    }

    write_outputs(&args.output_dir, &settings.name, &window, &report)?;

    let stats = cache.stats();
    info!(
        hits = stats.hits(),
        misses = stats.misses(),
        write_failures = stats.write_failures(),
        "Terrain cache stats"
    );

    Ok(())
}

fn write_outputs(dir: &Path, region: &str, window: &WeatherWindow, report: &PowderReport) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    if let Some(overlay) = &report.overlay {
        let png = encode_rgba(&overlay.pixels, overlay.width, overlay.height)
            .context("Failed to encode overlay PNG")?;
        let path = dir.join("overlay.png");
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            path = %path.display(),
            width = overlay.width,
            height = overlay.height,
            visible = overlay.visible_pixels(),
            "Wrote overlay"
        );
    } else {
        warn!("No overlay produced");
    }

    let sidecar = Sidecar {
        region,
        generated_at: Utc::now(),
        window_start: window.start,
        window_end: window.end,
        placement: report.overlay.as_ref().map(|o| o.placement),
        width: report.overlay.as_ref().map(|o| o.width),
        height: report.overlay.as_ref().map(|o| o.height),
        wind: report.wind.as_ref(),
        snowfall_in: report.snowfall_in,
        precip_in: report.precip_in,
        terrain_cached: report.terrain.map(|o| o == CacheOutcome::Hit),
        status: &report.status,
    };

    let path = dir.join("overlay.json");
    let json = serde_json::to_string_pretty(&sidecar).context("Failed to serialize sidecar")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote sidecar");

    Ok(())
}
