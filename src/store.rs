//! Read-only access to the objects of the archive bucket.
use crate::config::StorageSettings;
use anyhow::Result;
use futures_util::stream::BoxStream;

mod http;
mod s3;

pub use http::HttpStore;
pub use s3::S3Store;

pub type ByteChunks = BoxStream<'static, Result<Vec<u8>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
    /// Hex MD5 digest of the object, when the store exposes one.
    pub md5: Option<String>,
}

pub trait ObjectStore {
    async fn head_object(&self, key: &str) -> Result<ObjectHead>;

    /// Bytes `start..=end` of the object.
    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ByteChunks>;
}

/// Store selected by the settings file.
pub enum Store {
    Http(HttpStore),
    S3(S3Store),
}

impl Store {
    pub async fn from_settings(settings: &StorageSettings) -> Result<Self> {
        let store = match settings {
            StorageSettings::Http { base_url } => Self::Http(HttpStore::new(base_url)?),
            StorageSettings::S3 {
                endpoint,
                bucket,
                region,
            } => Self::S3(S3Store::as_anon(bucket, region, endpoint.as_deref()).await),
        };
        Ok(store)
    }
}

impl ObjectStore for Store {
    async fn head_object(&self, key: &str) -> Result<ObjectHead> {
        match self {
            Self::Http(store) => store.head_object(key).await,
            Self::S3(store) => store.head_object(key).await,
        }
    }

    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ByteChunks> {
        match self {
            Self::Http(store) => store.get_object_range(key, start, end).await,
            Self::S3(store) => store.get_object_range(key, start, end).await,
        }
    }
}

/// GCS and S3 report the MD5 of non-composite objects as their ETag.
pub(crate) fn md5_from_etag(etag: &str) -> Option<String> {
    let etag = etag.trim().trim_matches('"');
    if etag.len() == 32 && etag.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(etag.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory store used by the transfer and download tests.
    use super::*;
    use crate::error::LandsatError;
    use futures_util::stream::{self, StreamExt};
    use md5::{Digest, Md5};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        objects: HashMap<String, Vec<u8>>,
        corrupt: Vec<String>,
        pub requests: Mutex<Vec<(String, u64, u64)>>,
    }

    impl MemoryStore {
        pub fn insert(&mut self, key: &str, content: &[u8]) {
            self.objects.insert(key.to_string(), content.to_vec());
        }

        /// Advertise a wrong digest for `key`.
        pub fn corrupt(&mut self, key: &str) {
            self.corrupt.push(key.to_string());
        }
    }

    impl ObjectStore for MemoryStore {
        async fn head_object(&self, key: &str) -> Result<ObjectHead> {
            let content = self.objects.get(key).ok_or(LandsatError::HttpStatus {
                status: 404,
                url: key.to_string(),
            })?;
            let md5 = if self.corrupt.iter().any(|k| k == key) {
                "00000000000000000000000000000000".to_string()
            } else {
                format!("{:x}", Md5::digest(content))
            };
            Ok(ObjectHead {
                size: content.len() as u64,
                md5: Some(md5),
            })
        }

        async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ByteChunks> {
            let content = self.objects.get(key).ok_or(LandsatError::HttpStatus {
                status: 404,
                url: key.to_string(),
            })?;
            self.requests
                .lock()
                .unwrap()
                .push((key.to_string(), start, end));
            let range = content[start as usize..=end as usize].to_vec();
            let chunks = range
                .chunks(3)
                .map(|c| Ok(c.to_vec()))
                .collect::<Vec<_>>();
            Ok(stream::iter(chunks).boxed())
        }
    }
}
