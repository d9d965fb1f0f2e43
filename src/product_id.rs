//! Parsing of Landsat Collection 1 product identifiers, e.g.
//! `LC08_L1GT_044034_20130330_20170310_01_T2`.
use crate::error::LandsatError;
use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?<sensor>L[COTEM]0\d)_(?<correction>L1[A-Z]{2})_(?<path>\d{3})(?<row>\d{3})_(?<acquired>\d{8})_(?<processed>\d{8})_(?<collection>\d{2})_(?<tier>T1|T2|RT)$",
    )
    .expect("Regex pattern should always compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMeta {
    pub product_id: String,
    pub sensor: String,
    pub correction: String,
    pub path: u32,
    pub row: u32,
    pub acquisition_date: NaiveDate,
    pub processing_date: NaiveDate,
    pub collection: u32,
    pub tier: String,
}

impl ProductMeta {
    pub fn parse(product_id: &str) -> Result<Self> {
        let invalid = || LandsatError::InvalidProductId(product_id.to_string());

        let captures = PRODUCT_ID.captures(product_id).ok_or_else(invalid)?;
        let (_, [sensor, correction, path, row, acquired, processed, collection, tier]) =
            captures.extract();

        let parse_date =
            |s: &str| NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| invalid());

        Ok(Self {
            product_id: product_id.to_string(),
            sensor: sensor.to_string(),
            correction: correction.to_string(),
            path: path.parse().map_err(|_| invalid())?,
            row: row.parse().map_err(|_| invalid())?,
            acquisition_date: parse_date(acquired)?,
            processing_date: parse_date(processed)?,
            collection: collection.parse().map_err(|_| invalid())?,
            tier: tier.to_string(),
        })
    }

    /// Remote key prefix of the product directory, relative to the bucket root.
    pub fn prefix(&self) -> String {
        format!(
            "{}/{:02}/{:03}/{:03}/{}/",
            self.sensor, self.collection, self.path, self.row, self.product_id
        )
    }

    /// Landsat mission number, `8` for `LC08`.
    pub fn satellite(&self) -> u32 {
        self.sensor[2..].parse().unwrap_or_default()
    }
}
