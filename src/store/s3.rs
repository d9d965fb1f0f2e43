//! S3-compatible access to the archive, e.g. through the GCS interoperability
//! endpoint or a mirror bucket.
use super::{md5_from_etag, ByteChunks, ObjectHead, ObjectStore};
use anyhow::Result;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use futures_util::stream::{self, StreamExt};

pub async fn anon_client(region: &str, endpoint: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .no_credentials()
        .region(Region::new(region.to_string()));
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let base_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&base_config)
        .force_path_style(true)
        .build();

    Client::from_conf(s3_config)
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    pub async fn as_anon(bucket: &str, region: &str, endpoint: Option<&str>) -> Self {
        let client = anon_client(region, endpoint).await;
        Self::new(client, bucket)
    }
}

impl ObjectStore for S3Store {
    async fn head_object(&self, key: &str) -> Result<ObjectHead> {
        log::debug!("HEAD s3://{}/{}", self.bucket, key);
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(ObjectHead {
            size: head.content_length().unwrap_or(0).max(0) as u64,
            md5: head.e_tag().and_then(md5_from_etag),
        })
    }

    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ByteChunks> {
        log::debug!("GET s3://{}/{} bytes={}-{}", self.bucket, key, start, end);
        let range = format!("bytes={}-{}", start, end);
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(range)
            .send()
            .await?;

        let chunks = stream::try_unfold(object.body, |mut body| async move {
            let next = body.try_next().await?;
            Ok::<_, anyhow::Error>(next.map(|bytes| (bytes.to_vec(), body)))
        });
        Ok(chunks.boxed())
    }
}
