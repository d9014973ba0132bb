use std::path::PathBuf;

use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error reading cookie file ({path}): {source}")]
    CookieFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error requesting {url}: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected page structure: {0}")]
    Structure(String),

    #[error("Could not parse session time from {0:?}")]
    SessionTime(String),

    #[error("Response for {0} does not name a usable file in its content-disposition header")]
    MissingFilename(Url),

    #[error("Error serializing sessions: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
