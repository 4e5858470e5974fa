//! Weather collaborators.
//!
//! Two kinds of source feed the pipeline:
//! - [`StationSource`]: a SNOTEL-style hourly CSV report. Snowfall is the
//!   rise in snow depth across the window; precipitation is the rise in the
//!   accumulation gauge. No wind.
//! - [`ModelSource`]: an Open-Meteo-style hourly forecast/reanalysis JSON
//!   with snowfall, precipitation and 10 m wind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use powder_common::{PowderError, PowderResult};
use scoring::WindSeries;

/// Time span the weather inputs cover, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeatherWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> PowderResult<Self> {
        if start >= end {
            return Err(PowderError::Config(format!(
                "weather window start {} is not before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `hours` leading up to `end`.
    pub fn last_hours(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: end - chrono::Duration::hours(i64::from(hours.max(1))),
            end,
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Snow and precipitation totals over a window, in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SnowReport {
    pub snowfall_in: f64,
    pub precip_in: f64,
}

/// A source of weather inputs.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Source name for logs and errors.
    fn name(&self) -> &'static str;

    /// Snowfall and precipitation over the window.
    async fn snowfall(&self, window: &WeatherWindow) -> PowderResult<SnowReport>;

    /// Hourly wind over the window.
    async fn wind(&self, _window: &WeatherWindow) -> PowderResult<WindSeries> {
        Err(PowderError::fetch(self.name(), "source does not report wind"))
    }
}

fn http_client(timeout: Duration) -> PowderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| PowderError::Config(format!("failed to create HTTP client: {}", e)))
}

async fn fetch_text(source: &'static str, request: reqwest::RequestBuilder) -> PowderResult<String> {
    let response = request
        .send()
        .await
        .map_err(|e| PowderError::fetch(source, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PowderError::fetch(source, format!("HTTP {}", status)));
    }

    response
        .text()
        .await
        .map_err(|e| PowderError::fetch(source, e.to_string()))
}

// ============================================================================
// Station reports
// ============================================================================

/// One row of a station report.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub time: DateTime<Utc>,
    pub snow_depth_in: Option<f64>,
    pub precip_accum_in: Option<f64>,
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn parse_optional(field: Option<&str>, line_no: usize) -> PowderResult<Option<f64>> {
    match field.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            PowderError::decode(format!("station report line {}: invalid number '{}'", line_no, s))
        }),
    }
}

/// Parse a station CSV report.
///
/// Lines starting with `#` are comments. The first remaining line is the
/// header; the first column is the timestamp and the snow depth and
/// precipitation accumulation columns are found by name. Empty cells are
/// missing values.
pub fn parse_station_csv(text: &str) -> PowderResult<Vec<StationRecord>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (_, header) = lines
        .next()
        .ok_or_else(|| PowderError::decode("station report has no header"))?;
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let find = |needle: &str| columns.iter().position(|c| c.contains(needle));

    let depth_col = find("snow depth")
        .ok_or_else(|| PowderError::decode("station report has no snow depth column"))?;
    let precip_col = find("precipitation accumulation");

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').collect();
        let time = fields
            .first()
            .and_then(|s| parse_timestamp(s))
            .ok_or_else(|| {
                PowderError::decode(format!("station report line {}: bad timestamp", line_no))
            })?;

        records.push(StationRecord {
            time,
            snow_depth_in: parse_optional(fields.get(depth_col).copied(), line_no)?,
            precip_accum_in: match precip_col {
                Some(col) => parse_optional(fields.get(col).copied(), line_no)?,
                None => None,
            },
        });
    }

    records.sort_by_key(|r| r.time);
    Ok(records)
}

/// Snow totals from station records within the window.
///
/// Needs at least two snow depth readings. Settling never yields negative
/// snowfall.
pub fn station_snow(records: &[StationRecord], window: &WeatherWindow) -> PowderResult<SnowReport> {
    let in_window = || records.iter().filter(|r| window.contains(r.time));

    let depths: Vec<f64> = in_window().filter_map(|r| r.snow_depth_in).collect();
    if depths.len() < 2 {
        return Err(PowderError::decode(format!(
            "station report has {} snow depth readings in window, need at least 2",
            depths.len()
        )));
    }
    let snowfall = (depths[depths.len() - 1] - depths[0]).max(0.0);

    let accum: Vec<f64> = in_window().filter_map(|r| r.precip_accum_in).collect();
    let precip = match (accum.first(), accum.last()) {
        (Some(first), Some(last)) if accum.len() >= 2 => (last - first).max(0.0),
        _ => 0.0,
    };

    Ok(SnowReport {
        snowfall_in: snowfall,
        precip_in: precip,
    })
}

/// A station report endpoint.
///
/// The URL may contain `{start}` and `{end}` placeholders, filled with the
/// window's dates as `YYYY-MM-DD`.
pub struct StationSource {
    client: Client,
    url_template: String,
}

impl StationSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> PowderResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url_template: url_template.into(),
        })
    }

    pub fn report_url(&self, window: &WeatherWindow) -> String {
        self.url_template
            .replace("{start}", &window.start.format("%Y-%m-%d").to_string())
            .replace("{end}", &window.end.format("%Y-%m-%d").to_string())
    }
}

#[async_trait]
impl WeatherSource for StationSource {
    fn name(&self) -> &'static str {
        "station"
    }

    #[instrument(skip(self), fields(start = %window.start, end = %window.end))]
    async fn snowfall(&self, window: &WeatherWindow) -> PowderResult<SnowReport> {
        let url = self.report_url(window);
        let text = fetch_text(self.name(), self.client.get(&url)).await?;
        let records = parse_station_csv(&text)?;
        debug!(records = records.len(), "Parsed station report");
        station_snow(&records, window)
    }
}

// ============================================================================
// Model data
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

/// Hourly arrays from a model response. Missing arrays are empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub snowfall: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_gusts_10m: Vec<Option<f64>>,
}

/// Parse an hourly model response.
pub fn parse_model_json(text: &str) -> PowderResult<HourlySeries> {
    let response: ForecastResponse = serde_json::from_str(text)?;
    Ok(response.hourly)
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

impl HourlySeries {
    /// Indices of the hours inside the window, in order.
    fn hours_in(&self, window: &WeatherWindow) -> PowderResult<Vec<usize>> {
        let mut hours = Vec::new();
        for (i, t) in self.time.iter().enumerate() {
            let time = parse_timestamp(t)
                .ok_or_else(|| PowderError::decode(format!("model time '{}' is not ISO 8601", t)))?;
            if window.contains(time) {
                hours.push(i);
            }
        }
        Ok(hours)
    }

    /// Snowfall and precipitation summed over the window.
    pub fn snow(&self, window: &WeatherWindow) -> PowderResult<SnowReport> {
        let hours = self.hours_in(window)?;

        let snow: Vec<f64> = hours
            .iter()
            .filter_map(|&i| value_at(&self.snowfall, i))
            .collect();
        if snow.is_empty() {
            return Err(PowderError::decode("model has no snowfall values in window"));
        }

        let precip = hours
            .iter()
            .filter_map(|&i| value_at(&self.precipitation, i))
            .sum();

        Ok(SnowReport {
            snowfall_in: snow.iter().sum(),
            precip_in: precip,
        })
    }

    /// The hourly wind series over the window.
    pub fn wind(&self, window: &WeatherWindow) -> PowderResult<WindSeries> {
        let hours = self.hours_in(window)?;
        let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
            hours.iter().map(|&i| value_at(values, i)).collect()
        };

        Ok(WindSeries {
            speed_mph: pick(&self.wind_speed_10m),
            direction_deg: pick(&self.wind_direction_10m),
            gust_mph: pick(&self.wind_gusts_10m),
            precip_in: pick(&self.precipitation),
        })
    }
}

/// Last model response, reused while the requested window is unchanged.
///
/// Snowfall and wind are asked for concurrently; the lock is held across
/// the fetch so the second caller waits for the first one's response.
#[derive(Debug, Default)]
struct HourlyCache {
    last: Mutex<Option<(WeatherWindow, Arc<HourlySeries>)>>,
}

impl HourlyCache {
    async fn get_or_fetch<F, Fut>(
        &self,
        window: &WeatherWindow,
        fetch: F,
    ) -> PowderResult<Arc<HourlySeries>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PowderResult<HourlySeries>>,
    {
        let mut last = self.last.lock().await;
        if let Some((cached, hourly)) = last.as_ref() {
            if cached == window {
                return Ok(hourly.clone());
            }
        }

        let hourly = Arc::new(fetch().await?);
        *last = Some((*window, hourly.clone()));
        Ok(hourly)
    }
}

/// An Open-Meteo-compatible hourly endpoint for one point.
pub struct ModelSource {
    client: Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
    hourly_cache: HourlyCache,
}

impl ModelSource {
    pub fn new(
        base_url: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timeout: Duration,
    ) -> PowderResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            latitude,
            longitude,
            hourly_cache: HourlyCache::default(),
        })
    }

    /// Hourly series for the window, fetched at most once per window.
    async fn hourly(&self, window: &WeatherWindow) -> PowderResult<Arc<HourlySeries>> {
        self.hourly_cache
            .get_or_fetch(window, || self.fetch_hourly(window))
            .await
    }

    async fn fetch_hourly(&self, window: &WeatherWindow) -> PowderResult<HourlySeries> {
        let request = self.client.get(&self.base_url).query(&[
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            (
                "hourly",
                "snowfall,precipitation,wind_speed_10m,wind_direction_10m,wind_gusts_10m".into(),
            ),
            ("wind_speed_unit", "mph".into()),
            ("precipitation_unit", "inch".into()),
            ("timezone", "GMT".into()),
            ("start_date", window.start.format("%Y-%m-%d").to_string()),
            ("end_date", window.end.format("%Y-%m-%d").to_string()),
        ]);

        let text = fetch_text(self.name(), request).await?;
        let hourly = parse_model_json(&text)?;
        debug!(hours = hourly.time.len(), "Parsed model response");
        Ok(hourly)
    }
}

#[async_trait]
impl WeatherSource for ModelSource {
    fn name(&self) -> &'static str {
        "model"
    }

    #[instrument(skip(self), fields(start = %window.start, end = %window.end))]
    async fn snowfall(&self, window: &WeatherWindow) -> PowderResult<SnowReport> {
        self.hourly(window).await?.snow(window)
    }

    #[instrument(skip(self), fields(start = %window.start, end = %window.end))]
    async fn wind(&self, window: &WeatherWindow) -> PowderResult<WindSeries> {
        self.hourly(window).await?.wind(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_window() {
        assert!(WeatherWindow::new(utc(2024, 1, 2, 0), utc(2024, 1, 1, 0)).is_err());
        let w = WeatherWindow::last_hours(utc(2024, 1, 2, 0), 24);
        assert_eq!(w.start, utc(2024, 1, 1, 0));
        assert!(w.contains(utc(2024, 1, 1, 0)));
        assert!(w.contains(utc(2024, 1, 2, 0)));
        assert!(!w.contains(utc(2024, 1, 2, 1)));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp("2024-01-10 06:00"), Some(utc(2024, 1, 10, 6)));
        assert_eq!(parse_timestamp("2024-01-10T06:00"), Some(utc(2024, 1, 10, 6)));
        assert_eq!(parse_timestamp("2024-01-10"), Some(utc(2024, 1, 10, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_station_settling_is_not_negative() {
        let records = vec![
            StationRecord {
                time: utc(2024, 1, 10, 0),
                snow_depth_in: Some(50.0),
                precip_accum_in: Some(10.0),
            },
            StationRecord {
                time: utc(2024, 1, 10, 12),
                snow_depth_in: Some(48.0),
                precip_accum_in: Some(10.0),
            },
        ];
        let window = WeatherWindow::new(utc(2024, 1, 9, 0), utc(2024, 1, 11, 0)).unwrap();
        let report = station_snow(&records, &window).unwrap();
        assert_eq!(report.snowfall_in, 0.0);
        assert_eq!(report.precip_in, 0.0);
    }

    #[test]
    fn test_station_csv_missing_depth_column() {
        let csv = "Date,Air Temperature (degF)\n2024-01-10 00:00,20\n";
        assert!(matches!(
            parse_station_csv(csv),
            Err(PowderError::Decode(_))
        ));
    }

    #[test]
    fn test_station_csv_bad_number() {
        let csv = "Date,Snow Depth (in)\n2024-01-10 00:00,lots\n";
        assert!(parse_station_csv(csv).is_err());
    }

    fn counted_fetch(
        calls: &AtomicUsize,
    ) -> impl Future<Output = PowderResult<HourlySeries>> + '_ {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(HourlySeries {
                time: vec!["2024-01-10T00:00".into()],
                snowfall: vec![Some(1.0)],
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_hourly_cache_fetches_once_for_concurrent_callers() {
        let cache = HourlyCache::default();
        let calls = AtomicUsize::new(0);
        let window = WeatherWindow::last_hours(utc(2024, 1, 10, 6), 24);

        let (a, b) = tokio::join!(
            cache.get_or_fetch(&window, || counted_fetch(&calls)),
            cache.get_or_fetch(&window, || counted_fetch(&calls)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_hourly_cache_refetches_for_new_window() {
        let cache = HourlyCache::default();
        let calls = AtomicUsize::new(0);
        let first = WeatherWindow::last_hours(utc(2024, 1, 10, 6), 24);
        let second = WeatherWindow::last_hours(utc(2024, 1, 11, 6), 24);

        cache.get_or_fetch(&first, || counted_fetch(&calls)).await.unwrap();
        cache.get_or_fetch(&second, || counted_fetch(&calls)).await.unwrap();
        cache.get_or_fetch(&second, || counted_fetch(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hourly_cache_does_not_keep_failures() {
        let cache = HourlyCache::default();
        let calls = AtomicUsize::new(0);
        let window = WeatherWindow::last_hours(utc(2024, 1, 10, 6), 24);

        let failed = cache
            .get_or_fetch(&window, || async {
                Err(PowderError::fetch("model", "HTTP 502"))
            })
            .await;
        assert!(failed.is_err());

        cache.get_or_fetch(&window, || counted_fetch(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
