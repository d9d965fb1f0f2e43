//! Local copy of the archive index and searches over it.
//!
//! The index is the `index.csv.gz` file published at the bucket root, one
//! row per acquisition. It is decompressed once into the data directory and
//! streamed on every search.
use crate::aoi::{Aoi, LatLonBounds};
use crate::config::Settings;
use crate::error::LandsatError;
use crate::query::SearchQuery;
use crate::store::ObjectStore;
use crate::transfer::{self, TransferOptions};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.csv";

/// One row of the index. Columns not listed here are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct IndexRow {
    pub scene_id: String,
    pub product_id: String,
    pub sensing_time: String,
    pub wrs_path: u32,
    pub wrs_row: u32,
    pub cloud_cover: f64,
    pub north_lat: f64,
    pub south_lat: f64,
    pub west_lon: f64,
    pub east_lon: f64,
}

impl IndexRow {
    /// Sensing time truncated to the second, e.g. from
    /// `2013-03-30T18:41:29.8530830Z`.
    pub fn sensing_datetime(&self) -> Option<NaiveDateTime> {
        let time = self.sensing_time.get(..19)?;
        NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S").ok()
    }

    pub fn acquisition_date(&self) -> Option<NaiveDate> {
        self.sensing_datetime().map(|t| t.date())
    }

    /// Sensor code, the first four characters of the product ID.
    pub fn sensor(&self) -> Option<&str> {
        self.product_id.get(..4)
    }

    /// Collection tier, the last two characters of the product ID.
    pub fn tier(&self) -> Option<&str> {
        let len = self.product_id.len();
        self.product_id.get(len.checked_sub(2)?..)
    }

    pub fn bounds(&self) -> LatLonBounds {
        LatLonBounds {
            north: self.north_lat,
            south: self.south_lat,
            west: self.west_lon,
            east: self.east_lon,
        }
    }

    pub fn to_record(&self) -> Option<SceneRecord> {
        Some(SceneRecord {
            product_id: self.product_id.clone(),
            scene_id: self.scene_id.clone(),
            path: self.wrs_path,
            row: self.wrs_row,
            sensing_time: self.sensing_datetime()?,
            cloud_cover: self.cloud_cover,
            bounds: self.bounds(),
        })
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub product_id: String,
    pub scene_id: String,
    pub path: u32,
    pub row: u32,
    pub sensing_time: NaiveDateTime,
    pub cloud_cover: f64,
    pub bounds: LatLonBounds,
}

#[derive(Serialize)]
struct CsvRecord<'a> {
    product_id: &'a str,
    scene_id: &'a str,
    path: u32,
    row: u32,
    sensing_time: String,
    cloud_cover: f64,
}

/// Write search results as CSV, one row per scene, dates as `YYYY-MM-DD`.
pub fn write_csv<P: AsRef<Path>>(records: &[SceneRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRecord {
            product_id: &record.product_id,
            scene_id: &record.scene_id,
            path: record.path,
            row: record.row,
            sensing_time: record.sensing_time.format("%Y-%m-%d").to_string(),
            cloud_cover: record.cloud_cover,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// A WRS-2 path/row intersecting an area of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct WrsHit {
    pub path: u32,
    pub row: u32,
    /// Footprint from the first index row seen for this path/row.
    pub bounds: LatLonBounds,
    /// Share of the area of interest inside the footprint. Points have none.
    pub coverage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    AlreadyPresent,
    Synced,
}

pub struct Catalog {
    data_dir: PathBuf,
    catalog_key: String,
}

impl Catalog {
    pub fn new<P: AsRef<Path>>(data_dir: P, catalog_key: &str) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            catalog_key: catalog_key.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.data_dir, &settings.catalog_key)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    pub fn exists(&self) -> bool {
        self.index_path().is_file()
    }

    /// Download and decompress the index. An existing index is kept unless
    /// `force` is set.
    pub async fn sync(
        &self,
        store: &impl ObjectStore,
        force: bool,
        progress: bool,
    ) -> Result<SyncOutcome> {
        if self.exists() && !force {
            log::info!("Catalog index already exists at {}", self.index_path().display());
            return Ok(SyncOutcome::AlreadyPresent);
        }

        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;

        log::info!("Syncing catalog index from {}", self.catalog_key);
        let options = TransferOptions {
            progress,
            verify: false,
        };
        let archive = self.data_dir.join(format!("{INDEX_FILE}.gz"));
        transfer::download_to(store, &self.catalog_key, &archive, options).await?;
        if let Err(e) = transfer::decompress(&archive, true) {
            // Fetch again on the next sync rather than reuse a bad archive
            let _ = fs::remove_file(&archive);
            return Err(e);
        }

        log::info!("Catalog index written to {}", self.index_path().display());
        Ok(SyncOutcome::Synced)
    }

    /// Sync the index only when it is missing.
    pub async fn ensure(&self, store: &impl ObjectStore, progress: bool) -> Result<()> {
        if !self.exists() {
            self.sync(store, false, progress).await?;
        }
        Ok(())
    }

    /// Visit every row that carries a product ID. Rows that cannot be parsed
    /// are counted and skipped.
    fn scan<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(IndexRow) -> bool,
    {
        let path = self.index_path();
        if !path.is_file() {
            return Err(LandsatError::CatalogMissing(path).into());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        let product_column = headers
            .iter()
            .position(|h| h == "PRODUCT_ID")
            .ok_or_else(|| anyhow::anyhow!("PRODUCT_ID column missing from {}", path.display()))?;

        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record?;
            // Pre-collection scenes have no product ID
            if record.get(product_column).map_or(true, str::is_empty) {
                continue;
            }
            match record.deserialize::<IndexRow>(Some(&headers)) {
                Ok(row) => {
                    if !visit(row) {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("Skipping malformed index row: {e}");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {skipped} malformed rows in {}", path.display());
        }
        Ok(())
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SceneRecord>> {
        let mut scenes = vec![];
        self.scan(|row| {
            if query.matches(&row) {
                if let Some(record) = row.to_record() {
                    scenes.push(record);
                }
            }
            true
        })?;
        log::info!("{} scenes found", scenes.len());
        Ok(scenes)
    }

    /// WRS-2 paths and rows whose footprint intersects `aoi`, sorted by
    /// path then row.
    pub fn wrs(&self, aoi: &Aoi) -> Result<Vec<WrsHit>> {
        let mut footprints: BTreeMap<(u32, u32), LatLonBounds> = BTreeMap::new();
        self.scan(|row| {
            footprints
                .entry((row.wrs_path, row.wrs_row))
                .or_insert_with(|| row.bounds());
            true
        })?;
        let hits = footprints
            .into_iter()
            .filter(|(_, bounds)| aoi.intersects(bounds))
            .map(|((path, row), bounds)| WrsHit {
                path,
                row,
                bounds,
                coverage: aoi.coverage(&bounds),
            })
            .collect();
        Ok(hits)
    }

    /// Catalog entry of a single product.
    pub fn metadata(&self, product_id: &str) -> Result<Option<SceneRecord>> {
        let mut found = None;
        self.scan(|row| {
            if row.product_id == product_id {
                found = row.to_record();
                return false;
            }
            true
        })?;
        Ok(found)
    }
}
