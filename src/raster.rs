//! Georeferencing helpers and, with the `raster` feature, band access through
//! GDAL.

/// GDAL-ordered affine transform:
/// `[origin x, pixel width, row rotation, origin y, column rotation, pixel height]`.
pub type GeoTransform = [f64; 6];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

/// Raster bounds from a north-up transform and its size in pixels.
pub fn bounds_from_transform(transform: &GeoTransform, width: usize, height: usize) -> BoundingBox {
    let (left, xres) = (transform[0], transform[1]);
    let (top, yres) = (transform[3], transform[5]);
    BoundingBox {
        left,
        bottom: top + yres * height as f64,
        right: left + xres * width as f64,
        top,
    }
}

#[cfg(feature = "raster")]
pub use gdal_io::RasterFile;

#[cfg(feature = "raster")]
mod gdal_io {
    use super::GeoTransform;
    use anyhow::Result;
    use gdal::Dataset;
    use ndarray::Array2;
    use std::path::{Path, PathBuf};

    /// Single-band GeoTIFF, opened on every access.
    #[derive(Debug, Clone)]
    pub struct RasterFile {
        path: PathBuf,
    }

    impl RasterFile {
        pub fn new<P: AsRef<Path>>(path: P) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        fn open(&self) -> Result<Dataset> {
            Ok(Dataset::open(&self.path)?)
        }

        /// First band as `(rows, columns)`, converted to `f64`.
        pub fn read(&self) -> Result<Array2<f64>> {
            let dataset = self.open()?;
            let band = dataset.rasterband(1)?;
            let (width, height) = band.size();
            let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
            Ok(Array2::from_shape_vec((height, width), buffer.data().to_vec())?)
        }

        /// `(width, height)` in pixels.
        pub fn size(&self) -> Result<(usize, usize)> {
            Ok(self.open()?.raster_size())
        }

        pub fn transform(&self) -> Result<GeoTransform> {
            Ok(self.open()?.geo_transform()?)
        }

        /// Coordinate reference system as WKT.
        pub fn crs(&self) -> Result<String> {
            Ok(self.open()?.spatial_ref()?.to_wkt()?)
        }

        pub fn nodata(&self) -> Result<Option<f64>> {
            Ok(self.open()?.rasterband(1)?.no_data_value())
        }
    }
}
