use std::{fmt, path::PathBuf, str::FromStr};

use crate::error::Error;

pub const S3_SCHEME: &str = "s3://";
pub const LOCAL_SCHEME: &str = "file://";
pub const MEMORY_SCHEME: &str = "memory://";

/// Where objects live. Bucket names are per call, so an S3 URL carries no bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageUrl {
    #[default]
    S3,
    Local(PathBuf),
    Memory,
}

impl FromStr for StorageUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == S3_SCHEME {
            Ok(StorageUrl::S3)
        } else if s == MEMORY_SCHEME {
            Ok(StorageUrl::Memory)
        } else if let Some(path_str) = s.strip_prefix(LOCAL_SCHEME) {
            if path_str.is_empty() {
                return Err(Error::InvalidStorageUrl(s.to_owned()));
            }

            Ok(StorageUrl::Local(path_str.into()))
        } else {
            Err(Error::InvalidStorageUrl(s.to_owned()))
        }
    }
}

impl fmt::Display for StorageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageUrl::S3 => write!(f, "{S3_SCHEME}"),
            StorageUrl::Local(path) => write!(f, "{LOCAL_SCHEME}{}", path.display()),
            StorageUrl::Memory => write!(f, "{MEMORY_SCHEME}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schemes() {
        assert_eq!("s3://".parse::<StorageUrl>(), Ok(StorageUrl::S3));
        assert_eq!("memory://".parse::<StorageUrl>(), Ok(StorageUrl::Memory));
        assert_eq!(
            "file:///var/data".parse::<StorageUrl>(),
            Ok(StorageUrl::Local(PathBuf::from("/var/data")))
        );
    }

    #[test]
    fn parse_invalid() {
        assert!("file://".parse::<StorageUrl>().is_err());
        assert!("gs://bucket".parse::<StorageUrl>().is_err());
        assert!("/var/data".parse::<StorageUrl>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        let url = StorageUrl::Local(PathBuf::from("data"));
        assert_eq!(url.to_string().parse::<StorageUrl>(), Ok(url));
    }
}
