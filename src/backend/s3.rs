use async_stream::try_stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    error::SdkError,
    operation::{get_object::GetObjectError, head_object::HeadObjectError},
    types::Object,
    Client,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use log::trace;
use tokio::task::spawn_blocking;
use tokio_stream::Stream;

use crate::{
    error::{Error, Result},
    record::RawObjectMetadata,
};

use super::{Backend, ObjectIterator};

#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    fetch_headers: bool,
}

impl S3Backend {
    pub async fn from_env(fetch_headers: bool) -> Self {
        let s3_config = aws_config::load_from_env().await;
        let client = Client::new(&s3_config);
        S3Backend::new(client, fetch_headers)
    }

    /// `fetch_headers` issues one `HeadObject` per listed object, since
    /// `ListObjectsV2` reports neither content type nor content encoding.
    pub fn new(client: Client, fetch_headers: bool) -> Self {
        S3Backend {
            client,
            fetch_headers,
        }
    }

    fn objects(
        &self,
        bucket: String,
        prefix: Option<String>,
    ) -> impl Stream<Item = Result<RawObjectMetadata>> + Send + 'static {
        let client = self.client.clone();
        let fetch_headers = self.fetch_headers;

        try_stream! {
            let mut pages = client
                .list_objects_v2()
                .bucket(&bucket)
                .set_prefix(prefix)
                .fetch_owner(true)
                .into_paginator()
                .send();

            while let Some(page) = pages.try_next().await? {
                let contents = page.contents.unwrap_or_default();
                trace!("listed page of {} objects from `{bucket}`", contents.len());

                for object in contents {
                    let mut metadata = object_metadata(object)?;
                    if fetch_headers {
                        let head = client
                            .head_object()
                            .bucket(&bucket)
                            .key(&metadata.name)
                            .send()
                            .await?;
                        metadata.content_type = head.content_type().unwrap_or_default().to_owned();
                        metadata.content_encoding =
                            head.content_encoding().unwrap_or_default().to_owned();
                    }

                    yield metadata;
                }
            }
        }
    }
}

#[async_trait]
impl Backend for S3Backend {
    fn open_iterator(&self, bucket: &str, prefix: Option<&str>) -> ObjectIterator {
        let stream = self.objects(bucket.to_owned(), prefix.map(ToOwned::to_owned));
        Box::pin(stream)
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let response_result = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(SdkError::into_service_error);

        match response_result {
            Ok(_) => Ok(true),
            Err(HeadObjectError::NotFound(_)) => Ok(false),
            Err(err) => Err(Error::other(err)),
        }
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                GetObjectError::NoSuchKey(_) => Error::ObjectNotFound {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                },
                err => Error::other(err),
            })?;

        let bytes = response.body.collect().await?.to_vec();
        Ok(bytes)
    }

    async fn put(&self, bucket: &str, key: &str, content_type: &str, data: Vec<u8>) -> Result<()> {
        let (data, encoded_digest) = spawn_blocking(move || {
            let encoded_digest = md5_base64(&data);
            (data, encoded_digest)
        })
        .await?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(data.into())
            .content_md5(encoded_digest)
            .send()
            .await?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }
}

fn object_metadata(object: Object) -> Result<RawObjectMetadata> {
    let name = object.key.ok_or_else(|| Error::InvalidKey(String::new()))?;
    let size = object
        .size
        .map(u64::try_from)
        .transpose()
        .map_err(|_| Error::InvalidKey(name.clone()))?
        .unwrap_or_default();
    let created = object
        .last_modified
        .and_then(|time| DateTime::from_timestamp(time.secs(), time.subsec_nanos()))
        .unwrap_or_default();
    let owner = object
        .owner
        .and_then(|owner| owner.id.or(owner.display_name))
        .unwrap_or_default();

    Ok(RawObjectMetadata {
        name,
        content_type: String::new(),
        owner,
        size,
        content_encoding: String::new(),
        created,
    })
}

fn md5_base64(bytes: &[u8]) -> String {
    let digest = md5::compute(bytes);
    BASE64_STANDARD.encode(digest.0)
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::{primitives::DateTime as AwsDateTime, types::Owner};

    use super::*;

    #[test]
    fn object_metadata_from_listing() {
        let object = Object::builder()
            .key("2024/a.txt")
            .size(12)
            .last_modified(AwsDateTime::from_secs(1_700_000_000))
            .owner(Owner::builder().id("owner-id").display_name("owner").build())
            .build();

        let metadata = object_metadata(object).unwrap();
        assert_eq!(metadata.name, "2024/a.txt");
        assert_eq!(metadata.size, 12);
        assert_eq!(metadata.owner, "owner-id");
        assert_eq!(metadata.created.timestamp(), 1_700_000_000);
        assert!(metadata.content_type.is_empty());
    }

    #[test]
    fn object_metadata_requires_key() {
        let object = Object::builder().size(1).build();
        assert_eq!(object_metadata(object), Err(Error::InvalidKey(String::new())));
    }

    #[test]
    fn md5_digest_is_base64() {
        assert_eq!(md5_base64(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }
}
