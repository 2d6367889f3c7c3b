mod local;
mod memory;
mod s3;
mod url;

use std::{fmt::Debug, pin::Pin, sync::Arc};

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::{
    config::Config,
    error::{Error, Result},
    record::RawObjectMetadata,
};

pub use self::{local::LocalBackend, memory::MemoryBackend, s3::S3Backend, url::StorageUrl};

/// Lazily paginated object metadata for one bucket, in the backend's native order.
///
/// `None` is end of sequence. The stream does no work until polled.
pub type ObjectIterator = Pin<Box<dyn Stream<Item = Result<RawObjectMetadata>> + Send + 'static>>;

pub type SharedBackend = Arc<dyn Backend>;

#[async_trait]
pub trait Backend: Debug + Send + Sync + 'static {
    /// Opens an iterator over `bucket`, restricted to keys starting with `prefix`.
    fn open_iterator(&self, bucket: &str, prefix: Option<&str>) -> ObjectIterator;

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
    async fn put(&self, bucket: &str, key: &str, content_type: &str, data: Vec<u8>) -> Result<()>;

    /// Removes `key` from `bucket`. Deleting a key that does not exist
    /// succeeds, as it does on S3.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    async fn try_get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        match self.get(bucket, key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(Error::ObjectNotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

pub async fn create_backend(config: &Config) -> SharedBackend {
    match &config.storage {
        StorageUrl::S3 => Arc::new(S3Backend::from_env(config.fetch_headers).await),
        StorageUrl::Local(path) => Arc::new(LocalBackend::new(path.clone(), config.latency)),
        StorageUrl::Memory => Arc::new(MemoryBackend::new()),
    }
}
