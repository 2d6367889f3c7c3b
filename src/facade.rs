use chrono::{DateTime, Utc};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{
    backend::{create_backend, SharedBackend},
    config::Config,
    error::{Error, Result},
    listing::{spawn_producer, ListingRequest, ObjectStream, TimeWindow},
};

/// Bucket listing plus single-object pass-through over one backend.
///
/// Cloning is cheap and shares the backend client.
#[derive(Debug, Clone)]
pub struct StorageFacade {
    backend: SharedBackend,
    config: Config,
}

impl StorageFacade {
    pub async fn new(config: Config) -> Self {
        debug!("using storage {}", config.storage);
        let backend = create_backend(&config).await;
        StorageFacade { backend, config }
    }

    pub fn with_backend(backend: SharedBackend, config: Config) -> Self {
        StorageFacade { backend, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lists every object in `bucket` under `prefix` (empty for all).
    ///
    /// Arguments are checked before anything is spawned; on success one
    /// producer task is running and owns the returned stream's channel.
    pub fn list_bucket(
        &self,
        bucket: &str,
        prefix: &str,
        buffer_size: usize,
        cancel: CancellationToken,
    ) -> Result<ObjectStream> {
        let request = ListingRequest::new(bucket, prefix, buffer_size)?;
        Ok(self.list(request, cancel))
    }

    /// Like [`list_bucket`](Self::list_bucket), keeping only objects created
    /// strictly between `start` and `end`. Both bounds are required.
    pub fn list_bucket_by_time(
        &self,
        bucket: &str,
        prefix: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        buffer_size: usize,
        cancel: CancellationToken,
    ) -> Result<ObjectStream> {
        let window = TimeWindow::from_bounds(start, end)?;
        let request = ListingRequest::new(bucket, prefix, buffer_size)?.with_window(window);
        Ok(self.list(request, cancel))
    }

    /// Spawns the producer for an already validated request.
    pub fn list(&self, request: ListingRequest, cancel: CancellationToken) -> ObjectStream {
        debug!(
            "listing `{}` with prefix {:?} into a buffer of {}",
            request.bucket(),
            request.prefix(),
            request.buffer_size(),
        );
        spawn_producer(self.backend.clone(), request, cancel)
    }

    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        validate_bucket(bucket)?;
        debug!("get `{key}` from `{bucket}`");
        self.backend.get(bucket, key).await
    }

    pub async fn put_object(
        &self,
        bucket: &str,
        content_type: &str,
        key: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        validate_bucket(bucket)?;
        debug!("put `{key}` ({content_type}, {} bytes) to `{bucket}`", data.len());
        self.backend.put(bucket, key, content_type, data).await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        validate_bucket(bucket)?;
        debug!("delete `{key}` from `{bucket}`");
        self.backend.delete(bucket, key).await
    }

    pub async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        validate_bucket(bucket)?;
        self.backend.exists(bucket, key).await
    }
}

fn validate_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        Err(Error::EmptyBucketName)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::StorageUrl;

    use super::*;

    async fn memory_facade() -> StorageFacade {
        let config = Config {
            storage: StorageUrl::Memory,
            ..Config::default()
        };
        StorageFacade::new(config).await
    }

    #[tokio::test]
    async fn object_pass_through() {
        let facade = memory_facade().await;
        facade
            .put_object("b", "application/json", "doc.json", b"{}".to_vec())
            .await
            .unwrap();
        assert!(facade.object_exists("b", "doc.json").await.unwrap());
        assert_eq!(facade.get_object("b", "doc.json").await.unwrap(), b"{}");

        let records = facade
            .list_bucket("b", "", 1, CancellationToken::new())
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content_type(), "application/json");
        assert_eq!(records[0].size(), 2);

        facade.delete_object("b", "doc.json").await.unwrap();
        assert_eq!(facade.delete_object("b", "doc.json").await, Ok(()));
        assert_eq!(
            facade.get_object("b", "doc.json").await,
            Err(Error::ObjectNotFound {
                bucket: "b".into(),
                key: "doc.json".into(),
            })
        );
    }

    #[tokio::test]
    async fn empty_bucket_name_is_rejected() {
        let facade = memory_facade().await;
        assert_eq!(facade.get_object("", "k").await, Err(Error::EmptyBucketName));
        assert_eq!(
            facade.put_object("", "text/plain", "k", vec![]).await,
            Err(Error::EmptyBucketName)
        );
        assert_eq!(facade.delete_object("", "k").await, Err(Error::EmptyBucketName));
    }

    #[tokio::test]
    async fn listing_missing_bucket_yields_error_item() {
        let facade = memory_facade().await;
        let stream = facade
            .list_bucket("absent", "", 4, CancellationToken::new())
            .unwrap();

        let item = stream.recv().await.unwrap();
        assert_eq!(
            item,
            Err(Error::backend_iteration(
                "absent",
                Error::BucketNotFound("absent".into())
            ))
        );
        assert!(stream.recv().await.is_none());
        assert!(stream.finish().await.unwrap().failed);
    }
}
