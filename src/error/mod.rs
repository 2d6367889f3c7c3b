mod from;

use std::fmt::Display;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("time-filtered listing requires both a start and an end time")]
    MissingDateRange,

    #[error("bucket name is empty")]
    EmptyBucketName,

    #[error("buffer size {0} is invalid, expected at least 1")]
    InvalidBufferSize(usize),

    #[error("bucket `{0}` does not exist")]
    BucketNotFound(String),

    #[error("no object found for key `{key}` in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },

    #[error("key `{0}` is invalid")]
    InvalidKey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage URL `{0}` is invalid")]
    InvalidStorageUrl(String),

    #[error("listing bucket `{bucket}` failed: {source}")]
    BackendIteration {
        bucket: String,
        source: Box<Error>,
    },

    #[error(transparent)]
    Other(AnyError),
}

#[derive(Error, Debug)]
pub struct AnyError(anyhow::Error);

impl Display for AnyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for AnyError {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl Error {
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(AnyError(error.into()))
    }

    pub fn backend_iteration(bucket: &str, error: Error) -> Self {
        Error::BackendIteration {
            bucket: bucket.to_owned(),
            source: Box::new(error),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Other(AnyError(error))
    }
}
