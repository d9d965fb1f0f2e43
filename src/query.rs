//! Search predicates over catalog rows.
use crate::aoi::Aoi;
use crate::catalog::IndexRow;
use crate::error::LandsatError;
use crate::sensors::{self, SENSORS, TIERS};
use anyhow::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum SpatialFilter {
    /// WRS-2 paths and rows. A scene matches when both its path and its row
    /// are listed.
    PathRow { paths: Vec<u32>, rows: Vec<u32> },
    Area(Aoi),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub spatial: SpatialFilter,
    pub max_cloud: f64,
    pub sensors: Vec<String>,
    pub tiers: Vec<String>,
    /// Keep Landsat 7 scenes acquired after the SLC failure.
    pub include_slc_off: bool,
}

/// Parse `YYYY-MM-DD`, or `YYYY` meaning January 1st.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let expanded = if value.len() == 4 {
        format!("{value}-01-01")
    } else {
        value.to_string()
    };
    NaiveDate::parse_from_str(&expanded, "%Y-%m-%d")
        .map_err(|_| invalid(&format!("invalid date {value}, expected YYYY-MM-DD")))
}

fn invalid(msg: &str) -> anyhow::Error {
    LandsatError::InvalidQuery(msg.to_string()).into()
}

#[derive(Debug, Default, Clone)]
pub struct SearchQueryBuilder {
    begin: Option<String>,
    end: Option<String>,
    paths: Vec<u32>,
    rows: Vec<u32>,
    aoi: Option<Aoi>,
    max_cloud: Option<f64>,
    sensors: Vec<String>,
    tiers: Vec<String>,
    include_slc_off: bool,
}

impl SearchQuery {
    pub fn builder() -> SearchQueryBuilder {
        SearchQueryBuilder::default()
    }

    pub fn matches(&self, row: &IndexRow) -> bool {
        let Some(date) = row.acquisition_date() else {
            return false;
        };
        if date < self.begin || date > self.end {
            return false;
        }
        if row.cloud_cover > self.max_cloud {
            return false;
        }
        if !self.sensors.iter().any(|s| row.sensor() == Some(s.as_str())) {
            return false;
        }
        if !self.tiers.iter().any(|t| row.tier() == Some(t.as_str())) {
            return false;
        }
        if !self.include_slc_off && row.sensor() == Some("LE07") && date >= sensors::slc_failure() {
            return false;
        }
        match &self.spatial {
            SpatialFilter::PathRow { paths, rows } => {
                paths.contains(&row.wrs_path) && rows.contains(&row.wrs_row)
            }
            SpatialFilter::Area(aoi) => aoi.intersects(&row.bounds()),
        }
    }
}

impl SearchQueryBuilder {
    pub fn begin(mut self, date: &str) -> Self {
        self.begin = Some(date.to_string());
        self
    }

    pub fn end(mut self, date: &str) -> Self {
        self.end = Some(date.to_string());
        self
    }

    pub fn path(mut self, path: u32) -> Self {
        self.paths.push(path);
        self
    }

    pub fn row(mut self, row: u32) -> Self {
        self.rows.push(row);
        self
    }

    pub fn aoi(mut self, aoi: Aoi) -> Self {
        self.aoi = Some(aoi);
        self
    }

    pub fn max_cloud(mut self, max_cloud: f64) -> Self {
        self.max_cloud = Some(max_cloud);
        self
    }

    pub fn sensors<S: AsRef<str>>(mut self, sensors: &[S]) -> Self {
        self.sensors
            .extend(sensors.iter().map(|s| s.as_ref().trim().to_string()));
        self
    }

    pub fn tiers<S: AsRef<str>>(mut self, tiers: &[S]) -> Self {
        self.tiers
            .extend(tiers.iter().map(|t| t.as_ref().trim().to_string()));
        self
    }

    pub fn include_slc_off(mut self, include: bool) -> Self {
        self.include_slc_off = include;
        self
    }

    pub fn build(self) -> Result<SearchQuery> {
        let begin = parse_date(self.begin.as_deref().ok_or_else(|| invalid("begin date is required"))?)?;
        let end = parse_date(self.end.as_deref().ok_or_else(|| invalid("end date is required"))?)?;
        if begin > end {
            return Err(invalid("begin date is after end date"));
        }

        // Path/row takes precedence over an area of interest
        let spatial = if !self.paths.is_empty() && !self.rows.is_empty() {
            SpatialFilter::PathRow {
                paths: self.paths,
                rows: self.rows,
            }
        } else if let Some(aoi) = self.aoi {
            SpatialFilter::Area(aoi)
        } else {
            return Err(invalid("no spatial information provided"));
        };

        let max_cloud = self.max_cloud.unwrap_or(100.0);
        if !(0.0..=100.0).contains(&max_cloud) {
            return Err(invalid("cloud cover must be between 0 and 100"));
        }

        let sensors = if self.sensors.is_empty() {
            SENSORS.iter().map(|s| s.to_string()).collect()
        } else {
            if let Some(unknown) = self.sensors.iter().find(|s| !SENSORS.contains(&s.as_str())) {
                return Err(invalid(&format!("unknown sensor {unknown}")));
            }
            self.sensors
        };

        let tiers = if self.tiers.is_empty() {
            TIERS.iter().map(|t| t.to_string()).collect()
        } else {
            if let Some(unknown) = self.tiers.iter().find(|t| !TIERS.contains(&t.as_str())) {
                return Err(invalid(&format!("unknown tier {unknown}")));
            }
            self.tiers
        };

        Ok(SearchQuery {
            begin,
            end,
            spatial,
            max_cloud,
            sensors,
            tiers,
            include_slc_off: self.include_slc_off,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(product_id: &str, sensing_time: &str, cloud_cover: f64) -> IndexRow {
        IndexRow {
            scene_id: "LE72050502003200EDC00".to_string(),
            product_id: product_id.to_string(),
            sensing_time: sensing_time.to_string(),
            wrs_path: 205,
            wrs_row: 50,
            cloud_cover,
            north_lat: 16.4,
            south_lat: 14.5,
            west_lon: -17.1,
            east_lon: -15.0,
        }
    }

    fn base() -> SearchQueryBuilder {
        SearchQuery::builder()
            .begin("2000")
            .end("2010-12-31")
            .path(205)
            .row(50)
    }

    #[rstest]
    #[case("2021", "2021-01-01")]
    #[case("2021-06-15", "2021-06-15")]
    #[case(" 1999-11-04 ", "1999-11-04")]
    fn test_parse_date(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            parse_date(input).unwrap(),
            NaiveDate::parse_from_str(expected, "%Y-%m-%d").unwrap()
        );
    }

    #[rstest]
    #[case(SearchQuery::builder().end("2010").path(1).row(1))]
    #[case(SearchQuery::builder().begin("2000").path(1).row(1))]
    #[case(SearchQuery::builder().begin("2000").end("2010"))]
    #[case(SearchQuery::builder().begin("2000").end("2010").path(1))]
    #[case(SearchQuery::builder().begin("2011").end("2010").path(1).row(1))]
    #[case(base().max_cloud(120.0))]
    #[case(base().sensors(&["LC09"]))]
    #[case(base().tiers(&["T3"]))]
    #[case(SearchQuery::builder().begin("2000/01/01").end("2010").path(1).row(1))]
    fn test_rejected(#[case] builder: SearchQueryBuilder) {
        let err = builder.build().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LandsatError>(),
            Some(LandsatError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let query = base().build().unwrap();
        assert_eq!(query.max_cloud, 100.0);
        assert_eq!(query.sensors.len(), SENSORS.len());
        assert_eq!(query.tiers, vec!["T1", "T2", "RT"]);
        assert!(!query.include_slc_off);
    }

    #[test]
    fn test_matches() {
        let query = base().max_cloud(20.0).build().unwrap();
        let pid = "LE07_L1TP_205050_20020101_20170216_01_T1";

        assert!(query.matches(&row(pid, "2002-01-01T11:20:00.1234560Z", 10.0)));
        // cloudy
        assert!(!query.matches(&row(pid, "2002-01-01T11:20:00.1234560Z", 30.0)));
        // out of the date range
        assert!(!query.matches(&row(pid, "2011-01-01T11:20:00Z", 10.0)));
        // unparseable sensing time
        assert!(!query.matches(&row(pid, "", 10.0)));
    }

    #[test]
    fn test_begin_date_inclusive() {
        let query = base().build().unwrap();
        let pid = "LT05_L1TP_205050_20000101_20170216_01_T1";
        assert!(query.matches(&row(pid, "2000-01-01T00:00:00Z", 0.0)));
        assert!(!query.matches(&row(pid, "1999-12-31T23:59:59Z", 0.0)));
    }

    #[test]
    fn test_end_date_inclusive() {
        let query = base().build().unwrap();
        let pid = "LT05_L1TP_205050_20101231_20170216_01_T1";
        assert!(query.matches(&row(pid, "2010-12-31T23:59:59Z", 0.0)));
    }

    #[test]
    fn test_slc_off() {
        let pid = "LE07_L1TP_205050_20030719_20170216_01_T1";
        let scene = row(pid, "2003-07-19T11:20:00Z", 0.0);

        assert!(!base().build().unwrap().matches(&scene));
        assert!(base().include_slc_off(true).build().unwrap().matches(&scene));

        // Other sensors are unaffected
        let tm = row("LT05_L1TP_205050_20030719_20170216_01_T1", "2003-07-19T11:20:00Z", 0.0);
        assert!(base().build().unwrap().matches(&tm));
    }

    #[test]
    fn test_sensor_and_tier_filters() {
        let query = base().sensors(&["LT05"]).tiers(&["T2"]).build().unwrap();
        assert!(query.matches(&row(
            "LT05_L1GS_205050_20050807_20170107_01_T2",
            "2005-08-07T10:00:00Z",
            0.0
        )));
        assert!(!query.matches(&row(
            "LT05_L1TP_205050_20050807_20170107_01_T1",
            "2005-08-07T10:00:00Z",
            0.0
        )));
        assert!(!query.matches(&row(
            "LE07_L1GT_205050_20000807_20170107_01_T2",
            "2000-08-07T10:00:00Z",
            0.0
        )));
    }

    #[test]
    fn test_area_filter() {
        let query = SearchQuery::builder()
            .begin("2000")
            .end("2010")
            .aoi(Aoi::from_lat_lon(15.5, -16.0).unwrap())
            .build()
            .unwrap();
        let pid = "LT05_L1TP_205050_20050101_20170216_01_T1";
        assert!(query.matches(&row(pid, "2005-01-01T11:20:00Z", 0.0)));

        let elsewhere = SearchQuery::builder()
            .begin("2000")
            .end("2010")
            .aoi(Aoi::from_lat_lon(45.0, 5.0).unwrap())
            .build()
            .unwrap();
        assert!(!elsewhere.matches(&row(pid, "2005-01-01T11:20:00Z", 0.0)));
    }
}
