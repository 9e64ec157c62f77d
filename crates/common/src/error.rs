//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a usable configuration. File errors carry the path
/// they came from; `Invalid` covers values that parse but are rejected.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
