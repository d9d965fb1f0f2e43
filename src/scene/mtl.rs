//! Parser for the `_MTL.txt` metadata files shipped with Level-1 products.
//!
//! ```text
//! GROUP = L1_METADATA_FILE
//!   GROUP = METADATA_FILE_INFO
//!     ORIGIN = "Image courtesy of the U.S. Geological Survey"
//!     PROCESSING_SOFTWARE_VERSION = "LPGS_12.8.2"
//!   END_GROUP = METADATA_FILE_INFO
//! END_GROUP = L1_METADATA_FILE
//! END
//! ```
use crate::error::LandsatError;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

const ROOT_GROUP: &str = "L1_METADATA_FILE";

#[derive(Debug, Clone, PartialEq)]
pub enum MtlValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MtlValue {
    fn parse(raw: &str) -> Self {
        let value = raw.trim().replace('"', "");
        if let Ok(i) = value.parse::<i64>() {
            Self::Integer(i)
        } else if let Ok(f) = value.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::Text(value)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MtlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

pub type MtlGroup = BTreeMap<String, MtlValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mtl {
    groups: BTreeMap<String, MtlGroup>,
}

impl Mtl {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut groups: BTreeMap<String, MtlGroup> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("END") {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or(anyhow!("Malformed MTL line {}: {}", n + 1, line))?;
            let key = key.trim();

            if key == "GROUP" {
                let name = value.trim();
                if name != ROOT_GROUP {
                    groups.entry(name.to_string()).or_default();
                    current = Some(name.to_string());
                }
                continue;
            }

            let group = current
                .as_ref()
                .ok_or(anyhow!("MTL parameter outside of a group at line {}", n + 1))?;
            groups
                .get_mut(group)
                .expect("Current group is always registered")
                .insert(key.to_string(), MtlValue::parse(value));
        }
        Ok(Self { groups })
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn group(&self, group: &str) -> Option<&MtlGroup> {
        self.groups.get(group)
    }

    pub fn get(&self, group: &str, key: &str) -> Option<&MtlValue> {
        self.groups.get(group)?.get(key)
    }

    fn require(&self, group: &str, key: &str) -> Result<&MtlValue> {
        self.get(group, key).ok_or_else(|| {
            LandsatError::MissingMetadata {
                group: group.to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }

    pub fn text(&self, group: &str, key: &str) -> Result<&str> {
        self.require(group, key)?
            .as_str()
            .ok_or(anyhow!("{group}/{key} is not a text value"))
    }

    pub fn number(&self, group: &str, key: &str) -> Result<f64> {
        self.require(group, key)?
            .as_f64()
            .ok_or(anyhow!("{group}/{key} is not a numeric value"))
    }

    pub fn integer(&self, group: &str, key: &str) -> Result<i64> {
        self.require(group, key)?
            .as_i64()
            .ok_or(anyhow!("{group}/{key} is not an integer value"))
    }
}
