//! Access to a downloaded Landsat Level-1 scene directory.
use crate::band::{self, Band};
use crate::error::LandsatError;
use crate::sensors::{self, BandTable};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub mod mtl;

pub use mtl::{Mtl, MtlValue};

const FILE_INFO: &str = "METADATA_FILE_INFO";
const PRODUCT: &str = "PRODUCT_METADATA";
const IMAGE: &str = "IMAGE_ATTRIBUTES";

#[derive(Debug, Clone)]
pub struct Scene {
    dir: PathBuf,
    mtl: Mtl,
}

impl Scene {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(LandsatError::NotFound(dir.to_path_buf()).into());
        }
        let dir = dir.canonicalize()?;
        let mtl_path = find_file(&dir, "MTL")?;
        let mtl = Mtl::read(&mtl_path)?;
        log::debug!("Opened scene {}", dir.display());
        Ok(Self { dir, mtl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mtl(&self) -> &Mtl {
        &self.mtl
    }

    /// GeoTIFF and text files of the scene, sorted by name.
    pub fn available_files(&self) -> Result<Vec<String>> {
        list_files(&self.dir)
    }

    /// Short names of the bands present on disk, e.g. `["blue", "green"]`.
    pub fn available_bands(&self) -> Result<Vec<String>> {
        let table = self.band_table()?;
        let bands = self
            .available_files()?
            .iter()
            .filter_map(|f| band::suffix_from_file_name(f))
            .filter(|suffix| band::is_band(suffix))
            .filter_map(|suffix| table.get(suffix))
            .map(|long_name| band::band_short_name(long_name))
            .collect();
        Ok(bands)
    }

    /// Path of the scene file with the given suffix (`B4`, `BQA`, `MTL`).
    pub fn file_path(&self, suffix: &str) -> Result<PathBuf> {
        find_file(&self.dir, suffix)
    }

    pub fn band_table(&self) -> Result<&'static BandTable> {
        sensors::band_table(self.sensor()?, self.spacecraft()?)
    }

    fn file_info(&self, key: &str) -> Result<&str> {
        self.mtl
            .text(FILE_INFO, &format!("LANDSAT_{key}"))
            .or_else(|_| self.mtl.text(FILE_INFO, key))
    }

    pub fn scene_id(&self) -> Result<&str> {
        self.file_info("SCENE_ID")
    }

    pub fn product_id(&self) -> Result<&str> {
        self.file_info("PRODUCT_ID")
    }

    pub fn spacecraft(&self) -> Result<&str> {
        self.mtl.text(PRODUCT, "SPACECRAFT_ID")
    }

    pub fn sensor(&self) -> Result<&str> {
        self.mtl.text(PRODUCT, "SENSOR_ID")
    }

    /// Acquisition date.
    pub fn date(&self) -> Result<NaiveDate> {
        let date = self.mtl.text(PRODUCT, "DATE_ACQUIRED")?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| anyhow!("Invalid DATE_ACQUIRED {date}: {e}"))
    }

    pub fn wrs_path(&self) -> Result<i64> {
        self.mtl.integer(PRODUCT, "WRS_PATH")
    }

    pub fn wrs_row(&self) -> Result<i64> {
        self.mtl.integer(PRODUCT, "WRS_ROW")
    }

    /// Sun elevation angle at scene center, in degrees.
    pub fn sun_elevation(&self) -> Result<f64> {
        self.mtl.number(IMAGE, "SUN_ELEVATION")
    }

    /// Band by short name (`nir`), long name (`Near Infrared (NIR)`) or
    /// file suffix (`B4`).
    pub fn band(&self, name: &str) -> Result<Band<'_>> {
        let suffix = if band::is_band(name) {
            name
        } else {
            band::suffix_from_name(name, self.band_table()?)?
        };
        Band::new(self, suffix)
    }

    /// Quality assessment band.
    pub fn quality(&self) -> Result<Band<'_>> {
        Band::new(self, "BQA")
    }
}

fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".TIF") || name.ends_with(".txt") {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

fn find_file(dir: &Path, suffix: &str) -> Result<PathBuf> {
    list_files(dir)?
        .into_iter()
        .find(|f| band::suffix_from_file_name(f) == Some(suffix))
        .map(|f| dir.join(f))
        .ok_or_else(|| LandsatError::NotFound(dir.join(format!("*_{suffix}.*"))).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Unit;
    use tempfile::TempDir;

    const SAMPLE_DIR: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/LT05_01_030_025_LT05_L1GS_030025_19860927_20161003_01_T2"
    );
    const PID: &str = "LT05_L1GS_030025_19860927_20161003_01_T2";

    fn sample_scene() -> Scene {
        Scene::open(SAMPLE_DIR).unwrap()
    }

    /// Sample MTL plus empty band files.
    fn scene_with_bands(suffixes: &[&str]) -> (TempDir, Scene) {
        let dir = TempDir::new().unwrap();
        let mtl = format!("{PID}_MTL.txt");
        fs::copy(Path::new(SAMPLE_DIR).join(&mtl), dir.path().join(&mtl)).unwrap();
        for suffix in suffixes {
            fs::write(dir.path().join(format!("{PID}_{suffix}.TIF")), b"").unwrap();
        }
        let scene = Scene::open(dir.path()).unwrap();
        (dir, scene)
    }

    #[test]
    fn test_open() {
        let scene = sample_scene();
        assert!(scene.dir().is_absolute());
        assert!(scene.mtl().contains_group("PRODUCT_METADATA"));
    }

    #[test]
    fn test_open_missing() {
        let err = Scene::open("/nonexistent/scene").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LandsatError>(),
            Some(LandsatError::NotFound(_))
        ));

        let empty = TempDir::new().unwrap();
        assert!(Scene::open(empty.path()).is_err());
    }

    #[test]
    fn test_available_files() {
        let scene = sample_scene();
        let files = scene.available_files().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("MTL.txt"));
        assert!(scene.file_path("MTL").is_ok());
        assert!(scene.file_path("B1").is_err());
    }

    #[test]
    fn test_metadata() {
        let scene = sample_scene();
        assert_eq!(scene.scene_id().unwrap(), "LT50300251986270XXX01");
        assert_eq!(scene.product_id().unwrap(), PID);
        assert_eq!(scene.spacecraft().unwrap(), "LANDSAT_5");
        assert_eq!(scene.sensor().unwrap(), "TM");
        assert_eq!(scene.date().unwrap(), NaiveDate::from_ymd_opt(1986, 9, 27).unwrap());
        assert_eq!(scene.wrs_path().unwrap(), 30);
        assert_eq!(scene.wrs_row().unwrap(), 25);
        assert_eq!(scene.sun_elevation().unwrap(), 34.95372925);
    }

    #[test]
    fn test_available_bands() {
        let (_dir, scene) = scene_with_bands(&["B3", "B4", "BQA"]);
        assert_eq!(scene.available_bands().unwrap(), vec!["red", "nir"]);
    }

    #[test]
    fn test_band() {
        let (_dir, scene) = scene_with_bands(&["B3", "B6"]);

        let red = scene.band("red").unwrap();
        assert_eq!(red.suffix, "B3");
        assert_eq!(red.number, Some(3));
        assert_eq!(red.long_name, "Red");
        assert!(red.path.ends_with(format!("{PID}_B3.TIF")));

        let (gain, bias) = red.gain_bias(Unit::Radiance).unwrap();
        assert_eq!((gain, bias), (1.0440, -2.21398));
        let (gain, bias) = red.gain_bias(Unit::Reflectance).unwrap();
        assert_eq!((gain, bias), (2.2536e-03, -0.004779));
        assert!(red.thermal_constants().is_err());

        let thermal = scene.band("B6").unwrap();
        assert_eq!(thermal.name, "tir");
        assert_eq!(thermal.thermal_constants().unwrap(), (607.76, 1260.56));

        // Listed for the sensor but not downloaded
        assert!(scene.band("nir").is_err());
        assert!(scene.band("cirrus").is_err());
    }

    #[test]
    fn test_quality() {
        let (_dir, scene) = scene_with_bands(&["BQA"]);
        let quality = scene.quality().unwrap();
        assert_eq!(quality.number, None);
        assert_eq!(quality.name, "qa");
        assert!(quality.gain_bias(Unit::Radiance).is_err());
    }
}
