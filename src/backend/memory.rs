use std::{collections::BTreeMap, sync::Arc};

use async_stream::try_stream;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio_stream::Stream;

use crate::{
    error::{Error, Result},
    record::RawObjectMetadata,
};

use super::{Backend, ObjectIterator};

type Buckets = BTreeMap<String, BTreeMap<String, StoredObject>>;

#[derive(Debug, Clone)]
struct StoredObject {
    metadata: RawObjectMetadata,
    data: Vec<u8>,
}

/// Process-local object store. Keys list in byte order, like S3.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    buckets: Arc<RwLock<Buckets>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    pub async fn create_bucket(&self, bucket: &str) {
        self.buckets
            .write()
            .await
            .entry(bucket.to_owned())
            .or_default();
    }

    /// Stores `data` under `metadata.name`. The recorded size is always `data.len()`.
    pub async fn insert(&self, bucket: &str, mut metadata: RawObjectMetadata, data: Vec<u8>) {
        metadata.size = data.len() as u64;
        let key = metadata.name.clone();
        self.buckets
            .write()
            .await
            .entry(bucket.to_owned())
            .or_default()
            .insert(key, StoredObject { metadata, data });
    }

    fn objects(
        &self,
        bucket: String,
        prefix: Option<String>,
    ) -> impl Stream<Item = Result<RawObjectMetadata>> + Send + 'static {
        let buckets = self.buckets.clone();

        try_stream! {
            let snapshot = snapshot(&buckets, &bucket, prefix.as_deref()).await?;
            for metadata in snapshot {
                yield metadata;
            }
        }
    }
}

async fn snapshot(
    buckets: &RwLock<Buckets>,
    bucket: &str,
    prefix: Option<&str>,
) -> Result<Vec<RawObjectMetadata>> {
    let buckets = buckets.read().await;
    let objects = buckets
        .get(bucket)
        .ok_or_else(|| Error::BucketNotFound(bucket.to_owned()))?;
    let prefix = prefix.unwrap_or_default();

    let metadata = objects
        .range(prefix.to_owned()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(_, object)| object.metadata.clone())
        .collect();
    Ok(metadata)
}

#[async_trait]
impl Backend for MemoryBackend {
    fn open_iterator(&self, bucket: &str, prefix: Option<&str>) -> ObjectIterator {
        let stream = self.objects(bucket.to_owned(), prefix.map(ToOwned::to_owned));
        Box::pin(stream)
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let buckets = self.buckets.read().await;
        let exists = buckets
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key));
        Ok(exists)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.data.clone())
            .ok_or_else(|| Error::ObjectNotFound {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            })
    }

    async fn put(&self, bucket: &str, key: &str, content_type: &str, data: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidKey(key.to_owned()));
        }

        let metadata = RawObjectMetadata {
            name: key.to_owned(),
            content_type: content_type.to_owned(),
            owner: String::new(),
            size: 0,
            content_encoding: String::new(),
            created: Utc::now(),
        };
        self.insert(bucket, metadata, data).await;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        if let Some(objects) = self.buckets.write().await.get_mut(bucket) {
            objects.remove(key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;

    async fn names(backend: &MemoryBackend, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        backend
            .open_iterator(bucket, prefix)
            .map(|metadata| metadata.map(|m| m.name))
            .collect()
            .await
    }

    #[tokio::test]
    async fn prefix_listing_is_ordered() {
        let backend = MemoryBackend::new();
        for key in ["2024/b", "2023/a", "2024/a", "2025/a", "2024"] {
            backend.put("logs", key, "text/plain", vec![1]).await.unwrap();
        }

        assert_eq!(
            names(&backend, "logs", Some("2024/")).await.unwrap(),
            ["2024/a", "2024/b"]
        );
        assert_eq!(names(&backend, "logs", None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn missing_bucket_is_an_iterator_error() {
        let backend = MemoryBackend::new();
        assert_eq!(
            names(&backend, "absent", None).await,
            Err(Error::BucketNotFound("absent".into()))
        );

        backend.create_bucket("empty").await;
        assert_eq!(names(&backend, "empty", None).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn put_get_delete() {
        let backend = MemoryBackend::new();
        backend.put("b", "k", "text/plain", b"data".to_vec()).await.unwrap();
        assert_eq!(backend.get("b", "k").await.unwrap(), b"data");
        assert!(backend.exists("b", "k").await.unwrap());

        backend.delete("b", "k").await.unwrap();
        assert_eq!(backend.try_get("b", "k").await.unwrap(), None);
        assert_eq!(backend.delete("b", "k").await, Ok(()));
        assert_eq!(backend.delete("absent", "k").await, Ok(()));
    }
}
