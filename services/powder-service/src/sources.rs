//! Elevation tile fetching.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use powder_common::{PowderError, PowderResult, TileCoord, TileResolution};

/// Supplies encoded elevation tiles.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Fetch the encoded image payload for one tile.
    async fn fetch_tile(&self, coord: TileCoord) -> PowderResult<Bytes>;
}

/// Tiles from an HTTP endpoint described by a URL template.
///
/// Placeholders: `{z}`, `{x}`, `{y}`, `{suffix}` (`@2x` for retina tiles,
/// empty otherwise) and `{token}`.
pub struct HttpTileSource {
    client: Client,
    template: String,
    token: Option<String>,
    resolution: TileResolution,
}

impl HttpTileSource {
    pub fn new(
        template: impl Into<String>,
        token: Option<String>,
        resolution: TileResolution,
        timeout: Duration,
    ) -> PowderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| PowderError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            template: template.into(),
            token,
            resolution,
        })
    }

    /// Fill the template for a tile.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        self.template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{suffix}", self.resolution.url_suffix())
            .replace("{token}", self.token.as_deref().unwrap_or(""))
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    #[instrument(skip(self), fields(tile = %coord))]
    async fn fetch_tile(&self, coord: TileCoord) -> PowderResult<Bytes> {
        counter!("tile_fetches_total").increment(1);
        let url = self.tile_url(coord);

        let response = self.client.get(&url).send().await.map_err(|e| {
            counter!("tile_fetch_failures_total").increment(1);
            PowderError::fetch("tiles", format!("{}: {}", coord, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            counter!("tile_fetch_failures_total").increment(1);
            warn!(status = %status, "Tile request failed");
            return Err(PowderError::fetch(
                "tiles",
                format!("{}: HTTP {}", coord, status),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PowderError::fetch("tiles", format!("{}: {}", coord, e)))?;

        debug!(bytes = bytes.len(), "Fetched tile");
        Ok(bytes)
    }
}
