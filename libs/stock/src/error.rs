use thiserror::Error;

/// Failure to produce a quote snapshot. Always recoverable by the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed quote payload: {0}")]
    Malformed(String),

    #[error("tick series is empty")]
    EmptyTicks,

    #[error("invalid quote timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("no market known for symbol {0}")]
    UnknownMarket(String),

    #[error("gave up waiting for quote of {0}")]
    TimedOut(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::Error),

    #[error("malformed watch list record: {0}")]
    MalformedRecord(String),

    #[error("store schema version {found} does not match expected {expected}")]
    SchemaMismatch { found: String, expected: u32 },
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("cannot read directory file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid directory definition: {0}")]
    Invalid(String),
}
