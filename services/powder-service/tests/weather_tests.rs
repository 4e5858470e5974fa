//! Parsing of station and model payloads.

use chrono::{TimeZone, Utc};

use powder_common::PowderError;
use powder_service::weather::{parse_model_json, parse_station_csv, station_snow};
use powder_service::WeatherWindow;
use scoring::aggregate_wind;
use test_utils::{assert_approx_eq, MODEL_JSON, STATION_CSV, STATION_CSV_SPARSE};

fn window(start_hour: u32, end: (u32, u32)) -> WeatherWindow {
    WeatherWindow::new(
        Utc.with_ymd_and_hms(2024, 1, 10, start_hour, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, end.0, end.1, 0, 0).unwrap(),
    )
    .unwrap()
}

// ============================================================================
// Station reports
// ============================================================================

#[test]
fn test_station_report_totals() {
    let records = parse_station_csv(STATION_CSV).unwrap();
    assert_eq!(records.len(), 5);

    let report = station_snow(&records, &window(0, (11, 0))).unwrap();
    assert_approx_eq!(report.snowfall_in, 6.0, 1e-9);
    assert_approx_eq!(report.precip_in, 0.6, 1e-9);
}

#[test]
fn test_station_report_partial_window() {
    let records = parse_station_csv(STATION_CSV).unwrap();
    let report = station_snow(&records, &window(6, (10, 18))).unwrap();
    assert_approx_eq!(report.snowfall_in, 4.0, 1e-9);
}

#[test]
fn test_station_report_needs_two_readings() {
    let records = parse_station_csv(STATION_CSV_SPARSE).unwrap();
    assert_eq!(records.len(), 2);
    assert!(matches!(
        station_snow(&records, &window(0, (11, 0))),
        Err(PowderError::Decode(_))
    ));
}

#[test]
fn test_station_report_without_header() {
    assert!(parse_station_csv("# only comments\n").is_err());
}

// ============================================================================
// Model responses
// ============================================================================

#[test]
fn test_model_snow_totals() {
    let hourly = parse_model_json(MODEL_JSON).unwrap();
    let report = hourly.snow(&window(0, (10, 3))).unwrap();
    assert_approx_eq!(report.snowfall_in, 3.0, 1e-9);
    assert_approx_eq!(report.precip_in, 0.3, 1e-9);

    let report = hourly.snow(&window(1, (10, 2))).unwrap();
    assert_approx_eq!(report.snowfall_in, 2.5, 1e-9);
}

#[test]
fn test_model_wind_series() {
    let hourly = parse_model_json(MODEL_JSON).unwrap();
    let series = hourly.wind(&window(0, (10, 3))).unwrap();
    assert_eq!(series.len(), 4);

    let wind = aggregate_wind(&series.samples().unwrap()).unwrap();
    assert_approx_eq!(wind.direction_deg, 270.0, 1e-9);
    assert_approx_eq!(wind.avg_speed_mph, 25.0, 1e-9);
    // The 41 mph gust arrives in an hour without a speed reading
    assert_eq!(wind.max_gust_mph, 38.0);
}

#[test]
fn test_model_without_snowfall_is_decode_error() {
    let json = r#"{"hourly": {"time": ["2024-01-10T00:00", "2024-01-10T01:00"]}}"#;
    let hourly = parse_model_json(json).unwrap();
    assert!(matches!(
        hourly.snow(&window(0, (10, 3))),
        Err(PowderError::Decode(_))
    ));

    let series = hourly.wind(&window(0, (10, 3))).unwrap();
    assert_eq!(series.len(), 2);
    assert!(aggregate_wind(&series.samples().unwrap()).is_err());
}

#[test]
fn test_model_malformed_json() {
    assert!(matches!(
        parse_model_json("{\"hourly\": [1, 2]}"),
        Err(PowderError::Decode(_))
    ));
}
