//! Static tables describing the Landsat sensors served by the archive.
use crate::error::LandsatError;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const SENSORS: [&str; 9] = [
    "LC08", "LE07", "LT05", "LT04", "LM05", "LM04", "LM03", "LM02", "LM01",
];

pub const TIERS: [&str; 3] = ["T1", "T2", "RT"];

/// Landsat 7 scan line corrector failure. ETM+ scenes acquired from this date
/// on have data gaps.
pub fn slc_failure() -> NaiveDate {
    NaiveDate::from_ymd_opt(2003, 5, 31).expect("SLC failure date is valid")
}

pub type BandTable = BTreeMap<String, String>;

static FILES: LazyLock<BTreeMap<String, Vec<String>>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("resources/files.json"))
        .expect("Embedded files.json should always parse")
});

static BANDS: LazyLock<BTreeMap<String, BandTable>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("resources/bands.json"))
        .expect("Embedded bands.json should always parse")
});

/// Supported sensor codes, newest first.
pub fn supported_sensors() -> Vec<&'static str> {
    SENSORS
        .iter()
        .copied()
        .filter(|s| FILES.contains_key(*s))
        .collect()
}

/// File labels (`B4.TIF`, `MTL.txt`, ...) published for a sensor code.
pub fn available_files(sensor: &str) -> Result<&'static [String]> {
    let files = FILES
        .get(sensor)
        .ok_or_else(|| LandsatError::UnknownSensor(sensor.to_string()))?;
    Ok(files.as_slice())
}

/// Band table for an instrument as named in the MTL file (`SENSOR_ID`).
///
/// MSS band numbering differs between Landsat 1-3 (B4-B7) and Landsat 4-5
/// (B1-B4), so the spacecraft (`LANDSAT_3`) is needed to pick the table.
pub fn band_table(sensor_id: &str, spacecraft: &str) -> Result<&'static BandTable> {
    let key = match (sensor_id, spacecraft) {
        ("MSS", "LANDSAT_1" | "LANDSAT_2" | "LANDSAT_3") => "MSS_EARLY",
        ("OLI" | "TIRS", _) => "OLI_TIRS",
        ("ETM" | "ETM+", _) => "ETM",
        (other, _) => other,
    };
    let table = BANDS
        .get(key)
        .ok_or_else(|| LandsatError::UnknownSensor(sensor_id.to_string()))?;
    Ok(table)
}
