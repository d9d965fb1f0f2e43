use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LandsatError {
    #[error("Invalid product identifier: {0}")]
    InvalidProductId(String),
    #[error("Sensor {0} not supported")]
    UnknownSensor(String),
    #[error("Band {0} not found")]
    UnknownBand(String),
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Server ignored range request for {0}")]
    RangeNotSupported(String),
    #[error("Download corrupted: {0}")]
    CorruptedDownload(PathBuf),
    #[error("No such file or directory: {0}")]
    NotFound(PathBuf),
    #[error("Catalog index not found at {0}, run `sync-database` first")]
    CatalogMissing(PathBuf),
    #[error("Metadata key {group}/{key} not found")]
    MissingMetadata { group: String, key: String },
}
