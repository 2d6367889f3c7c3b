use std::{
    env::{self, VarError},
    time::Duration,
};

use humantime::parse_duration;

use crate::{
    backend::StorageUrl,
    error::{Error, Result},
};

pub const ENV_VAR_STORAGE: &str = "BUCKETSTREAM_STORAGE";
pub const ENV_VAR_LATENCY: &str = "BUCKETSTREAM_LATENCY";
pub const ENV_VAR_DEBUG: &str = "BUCKETSTREAM_DEBUG";
pub const ENV_VAR_BUFFER_SIZE: &str = "BUCKETSTREAM_BUFFER_SIZE";
pub const ENV_VAR_FETCH_HEADERS: &str = "BUCKETSTREAM_FETCH_HEADERS";

pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Everything needed to construct a [`StorageFacade`](crate::StorageFacade).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageUrl,
    /// Simulated per-request latency, local storage only.
    pub latency: Option<Duration>,
    pub debug: bool,
    pub buffer_size: usize,
    pub fetch_headers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageUrl::default(),
            latency: None,
            debug: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            fetch_headers: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Config::from_lookup(get_env_var)
    }

    /// Builds a config from `lookup`, which returns `None` for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        let mut config = Config::default();

        if let Some(storage) = lookup(ENV_VAR_STORAGE)? {
            config.storage = storage.parse()?;
        }

        config.latency = lookup(ENV_VAR_LATENCY)?
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        if let Some(debug) = lookup(ENV_VAR_DEBUG)? {
            config.debug = parse_bool(ENV_VAR_DEBUG, &debug)?;
        }

        if let Some(buffer_size) = lookup(ENV_VAR_BUFFER_SIZE)? {
            config.buffer_size = parse_buffer_size(&buffer_size)?;
        }

        if let Some(fetch_headers) = lookup(ENV_VAR_FETCH_HEADERS)? {
            config.fetch_headers = parse_bool(ENV_VAR_FETCH_HEADERS, &fetch_headers)?;
        }

        Ok(config)
    }
}

fn get_env_var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(format!(
            "`{name}` must be a boolean, got `{value}`"
        ))),
    }
}

fn parse_buffer_size(value: &str) -> Result<usize> {
    let size = value
        .parse()
        .map_err(|_| {
            Error::InvalidConfig(format!(
                "`{ENV_VAR_BUFFER_SIZE}` must be a number, got `{value}`"
            ))
        })?;
    if size == 0 {
        return Err(Error::InvalidBufferSize(size));
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::PathBuf};

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|name| Ok(vars.get(name).cloned()))
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            (ENV_VAR_STORAGE, "file:///srv/objects"),
            (ENV_VAR_LATENCY, "20ms"),
            (ENV_VAR_DEBUG, "true"),
            (ENV_VAR_BUFFER_SIZE, "16"),
            (ENV_VAR_FETCH_HEADERS, "1"),
        ])
        .unwrap();

        assert_eq!(config.storage, StorageUrl::Local(PathBuf::from("/srv/objects")));
        assert_eq!(config.latency, Some(Duration::from_millis(20)));
        assert!(config.debug);
        assert_eq!(config.buffer_size, 16);
        assert!(config.fetch_headers);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            config_from(&[(ENV_VAR_DEBUG, "maybe")]),
            Err(Error::InvalidConfig(format!(
                "`{ENV_VAR_DEBUG}` must be a boolean, got `maybe`"
            )))
        );
        assert!(matches!(
            config_from(&[(ENV_VAR_BUFFER_SIZE, "lots")]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(config_from(&[(ENV_VAR_STORAGE, "ftp://x")]).is_err());
        assert_eq!(
            config_from(&[(ENV_VAR_BUFFER_SIZE, "0")]),
            Err(Error::InvalidBufferSize(0))
        );
    }
}
