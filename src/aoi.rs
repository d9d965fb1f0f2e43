//! Area or point of interest used as a spatial search filter.
use crate::error::LandsatError;
use anyhow::{Context, Result};
use geo::{coord, Area, BooleanOps, Intersects, LineString, MultiPolygon, Point, Polygon, Rect};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Geographic bounding box of a scene, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl LatLonBounds {
    /// Boxes crossing the antimeridian have `west > east` and are split in two.
    pub fn rects(&self) -> Vec<Rect<f64>> {
        if self.west <= self.east {
            vec![Rect::new(
                coord! { x: self.west, y: self.south },
                coord! { x: self.east, y: self.north },
            )]
        } else {
            vec![
                Rect::new(
                    coord! { x: self.west, y: self.south },
                    coord! { x: 180.0, y: self.north },
                ),
                Rect::new(
                    coord! { x: -180.0, y: self.south },
                    coord! { x: self.east, y: self.north },
                ),
            ]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Aoi {
    Point(Point<f64>),
    Area(MultiPolygon<f64>),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Point { coordinates: Vec<f64> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

fn invalid(msg: impl Into<String>) -> LandsatError {
    LandsatError::InvalidGeometry(msg.into())
}

fn to_point(position: &[f64]) -> Result<Point<f64>> {
    match position {
        [x, y, ..] => Ok(Point::new(*x, *y)),
        _ => Err(invalid("position needs at least two coordinates").into()),
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .map(|p| to_point(p).map(|p| p.0))
            .collect::<Result<Vec<_>>>()
            .map(LineString::from)
    });
    let exterior = rings
        .next()
        .ok_or_else(|| invalid("polygon without exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

impl Aoi {
    pub fn from_lat_lon(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(invalid(format!("lat/lon out of range: {lat}, {lon}")).into());
        }
        Ok(Self::Point(Point::new(lon, lat)))
    }

    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;
        Self::from_geojson_str(&content)
    }

    /// Accepts a Feature, a FeatureCollection (first feature only) or a bare
    /// Point, Polygon or MultiPolygon geometry.
    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)?;
        let geometry = match document.get("type").and_then(Value::as_str) {
            Some("Feature") => document.get("geometry"),
            Some("FeatureCollection") => document
                .get("features")
                .and_then(|f| f.get(0))
                .and_then(|f| f.get("geometry")),
            _ => Some(&document),
        }
        .ok_or_else(|| invalid("no GeoJSON feature found"))?;

        let geometry: GeoJsonGeometry = serde_json::from_value(geometry.clone())
            .map_err(|e| invalid(e.to_string()))?;
        let aoi = match geometry {
            GeoJsonGeometry::Point { coordinates } => Self::Point(to_point(&coordinates)?),
            GeoJsonGeometry::Polygon { coordinates } => {
                Self::Area(MultiPolygon::new(vec![to_polygon(&coordinates)?]))
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => Self::Area(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|p| to_polygon(p))
                    .collect::<Result<Vec<_>>>()?,
            )),
        };
        Ok(aoi)
    }

    pub fn intersects(&self, bounds: &LatLonBounds) -> bool {
        bounds.rects().iter().any(|rect| match self {
            Self::Point(point) => point.intersects(rect),
            Self::Area(area) => area.intersects(rect),
        })
    }

    /// Fraction of the area covered by `bounds`, in planar degrees. `None`
    /// for a point or a degenerate area.
    pub fn coverage(&self, bounds: &LatLonBounds) -> Option<f64> {
        let Self::Area(area) = self else {
            return None;
        };
        let total = area.unsigned_area();
        if total <= 0.0 {
            return None;
        }
        let covered: f64 = bounds
            .rects()
            .iter()
            .map(|rect| area.intersection(&rect.to_polygon()).unsigned_area())
            .sum();
        Some((covered / total).min(1.0))
    }
}
