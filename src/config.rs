//! Settings loaded from a TOML file, with environment overrides.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "landsat-archive";
pub const CONFIG_ENV: &str = "LANDSAT_CONFIG";
pub const DATA_DIR_ENV: &str = "LANDSAT_DATA_DIR";

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com/gcp-public-data-landsat/";
const DEFAULT_S3_ENDPOINT: &str = "https://storage.googleapis.com";
const DEFAULT_BUCKET: &str = "gcp-public-data-landsat";
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Where the catalog index (and this file, by default) lives.
    pub data_dir: PathBuf,
    /// Key of the gzipped catalog index, relative to the bucket root.
    pub catalog_key: String,
    pub storage: StorageSettings,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageSettings {
    Http {
        base_url: String,
    },
    S3 {
        endpoint: Option<String>,
        bucket: String,
        region: String,
    },
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::Http {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl StorageSettings {
    pub fn s3_default() -> Self {
        Self::S3 {
            endpoint: Some(DEFAULT_S3_ENDPOINT.to_string()),
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_key: "index.csv.gz".to_string(),
            storage: StorageSettings::default(),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}")))
}

impl Settings {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(settings)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolution order: explicit path, `LANDSAT_CONFIG`, `<data dir>/config.toml`
    /// when it exists, built-in defaults. `LANDSAT_DATA_DIR` always wins for
    /// the data directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let data_dir_override = env::var_os(DATA_DIR_ENV).map(PathBuf::from);

        let mut settings = match explicit {
            Some(path) => Self::read(path)?,
            None => {
                let data_dir = data_dir_override.clone().unwrap_or_else(default_data_dir);
                let candidate = data_dir.join("config.toml");
                if candidate.is_file() {
                    Self::read(candidate)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(data_dir) = data_dir_override {
            settings.data_dir = data_dir;
        }
        log::debug!("Using data directory {}", settings.data_dir.display());
        Ok(settings)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.csv")
    }
}
