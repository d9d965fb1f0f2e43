//! Bands of a downloaded scene.
//!
//! Naming used throughout, with examples:
//!
//! * file name: `LE07_L1TP_195049_20000422_20170212_01_T1_B4.TIF`
//! * file suffix: `B4`
//! * band number: `4`
//! * band long name: `Near Infrared (NIR)`
//! * band short name: `nir`
use crate::error::LandsatError;
use crate::scene::Scene;
use crate::sensors::BandTable;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// Length of a product identifier plus the `_` separator.
const PRODUCT_ID_PREFIX: usize = 41;

/// File suffix of a scene file, `B4` for `..._T1_B4.TIF`.
pub fn suffix_from_file_name(file_name: &str) -> Option<&str> {
    let file_name = Path::new(file_name).file_name()?.to_str()?;
    let rest = file_name.get(PRODUCT_ID_PREFIX..)?;
    rest.split('.').next().filter(|s| !s.is_empty())
}

/// `61` and `62` stand for the two gains of the ETM+ thermal band.
pub fn suffix_from_band_number(band_number: u8) -> String {
    match band_number {
        61 | 62 => format!("B6_VCID_{}", band_number % 10),
        n => format!("B{n}"),
    }
}

/// File suffix of a band given its long or short name.
pub fn suffix_from_name<'t>(band_name: &str, table: &'t BandTable) -> Result<&'t str> {
    table
        .iter()
        .find(|(_, long_name)| {
            long_name.as_str() == band_name || band_short_name(long_name) == band_name
        })
        .map(|(suffix, _)| suffix.as_str())
        .ok_or_else(|| LandsatError::UnknownBand(band_name.to_string()).into())
}

pub fn is_band(suffix: &str) -> bool {
    let mut chars = suffix.chars();
    chars.next() == Some('B') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// `B1` is band 1, `B6_VCID_1` and `B6_VCID_2` are bands 61 and 62.
pub fn band_number(suffix: &str) -> Result<u8> {
    if !is_band(suffix) {
        return Err(anyhow!("{suffix} does not refer to a band"));
    }
    let digits = &suffix[1..];
    let number = match digits.split_once("_VCID_") {
        Some((band, gain)) => format!("{band}{gain}"),
        None => digits.to_string(),
    };
    number
        .parse()
        .map_err(|_| anyhow!("{suffix} does not refer to a band"))
}

/// `Near Infrared (NIR)` becomes `nir`, `Coastal Aerosol` becomes
/// `coastal_aerosol`.
pub fn band_short_name(long_name: &str) -> String {
    let short = match (long_name.find('('), long_name.find(')')) {
        (Some(start), Some(end)) if start < end => long_name[start + 1..end].to_string(),
        _ => long_name.replace([' ', '-'], "_"),
    };
    short.to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Radiance,
    Reflectance,
}

impl Unit {
    fn key(&self) -> &'static str {
        match self {
            Self::Radiance => "RADIANCE",
            Self::Reflectance => "REFLECTANCE",
        }
    }
}

/// A band file of a scene together with its calibration metadata.
#[derive(Debug, Clone)]
pub struct Band<'a> {
    scene: &'a Scene,
    pub suffix: String,
    pub path: PathBuf,
    pub long_name: String,
    pub name: String,
    /// `None` for the quality band.
    pub number: Option<u8>,
}

impl<'a> Band<'a> {
    pub fn new(scene: &'a Scene, suffix: &str) -> Result<Self> {
        let path = scene.file_path(suffix)?;
        let long_name = scene
            .band_table()?
            .get(suffix)
            .ok_or_else(|| LandsatError::UnknownBand(suffix.to_string()))?
            .clone();
        let number = if is_band(suffix) {
            Some(band_number(suffix)?)
        } else {
            None
        };
        Ok(Self {
            scene,
            suffix: suffix.to_string(),
            path,
            name: band_short_name(&long_name),
            long_name,
            number,
        })
    }

    /// MTL key suffix, `6_VCID_1` for `B6_VCID_1`.
    fn mtl_band(&self) -> Result<&str> {
        if !is_band(&self.suffix) {
            return Err(anyhow!("{} has no calibration coefficients", self.suffix));
        }
        Ok(&self.suffix[1..])
    }

    /// Band-specific rescaling factors `(gain, bias)`.
    pub fn gain_bias(&self, unit: Unit) -> Result<(f64, f64)> {
        let band = self.mtl_band()?;
        let group = "RADIOMETRIC_RESCALING";
        let mtl = self.scene.mtl();
        let gain = mtl.number(group, &format!("{}_MULT_BAND_{}", unit.key(), band))?;
        let bias = mtl.number(group, &format!("{}_ADD_BAND_{}", unit.key(), band))?;
        Ok((gain, bias))
    }

    /// Thermal conversion constants `(K1, K2)`.
    pub fn thermal_constants(&self) -> Result<(f64, f64)> {
        let band = self.mtl_band()?;
        let group = "THERMAL_CONSTANTS";
        let mtl = self.scene.mtl();
        let k1 = mtl.number(group, &format!("K1_CONSTANT_BAND_{band}"))?;
        let k2 = mtl.number(group, &format!("K2_CONSTANT_BAND_{band}"))?;
        Ok((k1, k2))
    }
}

#[cfg(feature = "raster")]
mod pixels {
    use super::{Band, Unit};
    use crate::preprocessing;
    use crate::raster::{bounds_from_transform, BoundingBox, GeoTransform, RasterFile};
    use anyhow::Result;
    use ndarray::Array2;

    impl Band<'_> {
        fn raster(&self) -> RasterFile {
            RasterFile::new(&self.path)
        }

        /// DN values as a 2D array.
        pub fn read(&self) -> Result<Array2<f64>> {
            self.raster().read()
        }

        pub fn width(&self) -> Result<usize> {
            Ok(self.raster().size()?.0)
        }

        pub fn height(&self) -> Result<usize> {
            Ok(self.raster().size()?.1)
        }

        pub fn transform(&self) -> Result<GeoTransform> {
            self.raster().transform()
        }

        /// Coordinate reference system as WKT.
        pub fn crs(&self) -> Result<String> {
            self.raster().crs()
        }

        /// No-data value of the band, if set.
        pub fn nodata(&self) -> Result<Option<f64>> {
            self.raster().nodata()
        }

        pub fn bounds(&self) -> Result<BoundingBox> {
            let raster = self.raster();
            let (width, height) = raster.size()?;
            Ok(bounds_from_transform(&raster.transform()?, width, height))
        }

        pub fn to_radiance(&self) -> Result<Array2<f64>> {
            let (gain, bias) = self.gain_bias(Unit::Radiance)?;
            Ok(preprocessing::to_radiance(&self.read()?, gain, bias))
        }

        /// With `sun_correction`, divide by the sine of the scene's sun
        /// elevation angle.
        pub fn to_reflectance(&self, sun_correction: bool) -> Result<Array2<f64>> {
            let (gain, bias) = self.gain_bias(Unit::Reflectance)?;
            let sun_elevation = if sun_correction {
                Some(self.scene.sun_elevation()?)
            } else {
                None
            };
            Ok(preprocessing::to_reflectance(
                &self.read()?,
                gain,
                bias,
                sun_elevation,
            ))
        }

        pub fn to_brightness_temperature(&self) -> Result<Array2<f64>> {
            let (k1, k2) = self.thermal_constants()?;
            let radiance = self.to_radiance()?;
            Ok(preprocessing::to_brightness_temperature(&radiance, k1, k2))
        }
    }
}
