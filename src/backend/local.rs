use std::{
    io,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use async_stream::try_stream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use tokio::{fs, time::sleep};
use tokio_stream::Stream;

use crate::{
    error::{Error, Result},
    record::RawObjectMetadata,
};

use super::{Backend, ObjectIterator};

const METADATA_DIR: &str = ".metadata";
const METADATA_EXTENSION: &str = "json";

/// Buckets are directories under `path`; object attributes that the
/// filesystem cannot hold live in JSON sidecars under `.metadata/`.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    path: PathBuf,
    latency: Option<Duration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    content_encoding: String,
    owner: String,
    created: DateTime<Utc>,
}

impl LocalBackend {
    pub fn new(path: PathBuf, latency: Option<Duration>) -> Self {
        LocalBackend { path, latency }
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        validate_bucket(bucket)?;
        Ok(self.path.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_path(bucket)?.join(key))
    }

    fn sidecar_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let mut path = self.path.join(METADATA_DIR).join(bucket).join(key);
        path.as_mut_os_string().push(".");
        path.as_mut_os_string().push(METADATA_EXTENSION);
        Ok(path)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
    }

    fn objects(
        &self,
        bucket: String,
        prefix: Option<String>,
    ) -> impl Stream<Item = Result<RawObjectMetadata>> + Send + 'static {
        let backend = self.clone();

        try_stream! {
            backend.simulate_latency().await;
            let bucket_path = backend.bucket_path(&bucket)?;
            let mut keys = bucket_keys(&bucket, &bucket_path).await?;
            if let Some(prefix) = &prefix {
                keys.retain(|key| key.starts_with(prefix.as_str()));
            }
            keys.sort_unstable();

            for key in keys {
                let metadata = backend.stat(&bucket, key).await?;
                yield metadata;
            }
        }
    }

    async fn stat(&self, bucket: &str, key: String) -> Result<RawObjectMetadata> {
        let path = self.object_path(bucket, &key)?;
        let file_metadata = fs::metadata(&path).await?;
        let sidecar = self.read_sidecar(bucket, &key).await?;

        let (content_type, content_encoding, owner, created) = match sidecar {
            Some(sidecar) => (
                sidecar.content_type,
                sidecar.content_encoding,
                sidecar.owner,
                sidecar.created,
            ),
            None => {
                let modified = file_metadata.modified()?;
                (String::new(), String::new(), String::new(), modified.into())
            }
        };

        Ok(RawObjectMetadata {
            name: key,
            content_type,
            owner,
            size: file_metadata.len(),
            content_encoding,
            created,
        })
    }

    async fn read_sidecar(&self, bucket: &str, key: &str) -> Result<Option<Sidecar>> {
        let path = self.sidecar_path(bucket, key)?;
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_sidecar(&self, bucket: &str, key: &str, sidecar: &Sidecar) -> Result<()> {
        let path = self.sidecar_path(bucket, key)?;
        create_parent_dir(&path).await?;
        let bytes = serde_json::to_vec(sidecar)?;
        fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn open_iterator(&self, bucket: &str, prefix: Option<&str>) -> ObjectIterator {
        let stream = self.objects(bucket.to_owned(), prefix.map(ToOwned::to_owned));
        Box::pin(stream)
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.simulate_latency().await;

        let path = self.object_path(bucket, key)?;
        let exists = fs::try_exists(path).await?;
        Ok(exists)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.simulate_latency().await;

        let path = self.object_path(bucket, key)?;
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::ObjectNotFound {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, bucket: &str, key: &str, content_type: &str, data: Vec<u8>) -> Result<()> {
        self.simulate_latency().await;

        let path = self.object_path(bucket, key)?;
        create_parent_dir(&path).await?;
        fs::write(&path, &data).await?;

        let sidecar = Sidecar {
            content_type: content_type.to_owned(),
            content_encoding: String::new(),
            owner: String::new(),
            created: Utc::now(),
        };
        self.write_sidecar(bucket, key, &sidecar).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.simulate_latency().await;

        let path = self.object_path(bucket, key)?;
        match fs::remove_file(path).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                trace!("`{key}` was already absent from `{bucket}`");
            }
            result => result?,
        }

        let sidecar_path = self.sidecar_path(bucket, key)?;
        match fs::remove_file(sidecar_path).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            result => Ok(result?),
        }
    }
}

async fn bucket_keys(bucket: &str, bucket_path: &Path) -> Result<Vec<String>> {
    if fs::try_exists(bucket_path).await? {
        walk_keys(bucket_path).await
    } else {
        Err(Error::BucketNotFound(bucket.to_owned()))
    }
}

async fn walk_keys(root: &Path) -> Result<Vec<String>> {
    let mut keys = vec![];
    let mut pending = vec![root.to_owned()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else {
                keys.push(key_from_path(root, &path)?);
            }
        }
    }

    Ok(keys)
}

fn key_from_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::InvalidKey(path.to_string_lossy().into_owned()))?;
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>();
    Ok(parts.join("/"))
}

async fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    Ok(())
}

fn validate_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(Error::EmptyBucketName);
    }

    if bucket.starts_with('.') || bucket.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidKey(bucket.to_owned()));
    }

    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.contains('\0')
        && Path::new(key)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;

    fn backend(dir: &tempfile::TempDir) -> LocalBackend {
        LocalBackend::new(dir.path().to_owned(), None)
    }

    #[tokio::test]
    async fn put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        backend
            .put("docs", "2024/a.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();
        assert!(backend.exists("docs", "2024/a.txt").await.unwrap());
        assert_eq!(backend.get("docs", "2024/a.txt").await.unwrap(), b"hello");

        backend.delete("docs", "2024/a.txt").await.unwrap();
        assert!(!backend.exists("docs", "2024/a.txt").await.unwrap());
        assert_eq!(backend.try_get("docs", "2024/a.txt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        assert_eq!(backend.delete("docs", "missing").await, Ok(()));

        backend.put("docs", "k", "text/plain", vec![1]).await.unwrap();
        backend.delete("docs", "k").await.unwrap();
        assert_eq!(backend.delete("docs", "k").await, Ok(()));
    }

    #[tokio::test]
    async fn iterator_lists_sorted_keys_with_sidecar_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        for key in ["b/2.txt", "a.txt", "b/1.txt", "c.bin"] {
            backend
                .put("docs", key, "text/plain", vec![0; 3])
                .await
                .unwrap();
        }

        let listed = backend
            .open_iterator("docs", Some("b/"))
            .collect::<Result<Vec<_>>>()
            .await
            .unwrap();
        let names = listed.iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["b/1.txt", "b/2.txt"]);
        assert!(listed.iter().all(|m| m.content_type == "text/plain" && m.size == 3));
    }

    #[tokio::test]
    async fn iterator_missing_bucket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut objects = backend(&dir).open_iterator("nope", None);
        assert_eq!(
            objects.next().await,
            Some(Err(Error::BucketNotFound("nope".into())))
        );
        assert!(objects.next().await.is_none());
    }

    #[test]
    fn rejects_escaping_keys() {
        assert!(validate_key("a/b.txt").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../secret").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("./a").is_err());
        assert!(validate_bucket(".metadata").is_err());
        assert_eq!(validate_bucket(""), Err(Error::EmptyBucketName));
    }
}
