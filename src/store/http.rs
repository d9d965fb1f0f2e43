use super::{md5_from_etag, ByteChunks, ObjectHead, ObjectStore};
use crate::error::LandsatError;
use anyhow::{anyhow, Result};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, ETAG, RANGE};
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// Anonymous HTTPS access to a public bucket, e.g.
/// `https://storage.googleapis.com/gcp-public-data-landsat/`.
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with a slash
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        Ok(Self { client, base_url })
    }

    pub fn url(&self, key: &str) -> Result<Url> {
        self.base_url
            .join(key.trim_start_matches('/'))
            .map_err(|e| anyhow!("Invalid object key {key}: {e}"))
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(LandsatError::HttpStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        }
        .into());
    }
    Ok(response)
}

/// GCS may transcode objects on the fly, in which case `Content-Length`
/// describes the served bytes rather than the stored ones.
fn object_size(headers: &HeaderMap) -> u64 {
    headers
        .get("x-goog-stored-content-length")
        .or_else(|| headers.get(CONTENT_LENGTH))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

impl ObjectStore for HttpStore {
    async fn head_object(&self, key: &str) -> Result<ObjectHead> {
        let url = self.url(key)?;
        log::debug!("HEAD {url}");
        let response = check_status(self.client.head(url).send().await?)?;
        let headers = response.headers();
        let md5 = headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .and_then(md5_from_etag);
        Ok(ObjectHead {
            size: object_size(headers),
            md5,
        })
    }

    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ByteChunks> {
        let url = self.url(key)?;
        log::debug!("GET {url} bytes={start}-{end}");
        let response = self
            .client
            .get(url.clone())
            .header(RANGE, format!("bytes={}-{}", start, end))
            .send()
            .await?;
        let response = check_status(response)?;
        if start > 0 && response.status() != StatusCode::PARTIAL_CONTENT {
            return Err(LandsatError::RangeNotSupported(url.to_string()).into());
        }
        let chunks = response
            .bytes_stream()
            .map_ok(|bytes| bytes.to_vec())
            .map_err(anyhow::Error::from)
            .boxed();
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_url() {
        let store = HttpStore::new("https://storage.googleapis.com/gcp-public-data-landsat").unwrap();
        assert_eq!(
            store.url("LC08/01/044/034/index.html").unwrap().as_str(),
            "https://storage.googleapis.com/gcp-public-data-landsat/LC08/01/044/034/index.html"
        );
        assert_eq!(
            store.url("/index.csv.gz").unwrap().as_str(),
            "https://storage.googleapis.com/gcp-public-data-landsat/index.csv.gz"
        );
    }

    #[test]
    fn test_object_size() {
        let mut headers = HeaderMap::new();
        assert_eq!(object_size(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("120"));
        assert_eq!(object_size(&headers), 120);

        headers.insert(
            "x-goog-stored-content-length",
            HeaderValue::from_static("4096"),
        );
        assert_eq!(object_size(&headers), 4096);
    }
}
