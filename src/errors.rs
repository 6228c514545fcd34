// errors.rs
use thiserror::Error;

/// Failures raised at the collaborator boundary (aggregator API, listing database).
///
/// The listing service never lets these escape from a search: they are
/// rendered into the result's `errors` list and the other source carries on.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("database connection unavailable")]
    ConnectionUnavailable,

    #[error("fetch task panicked")]
    Panicked,

    #[error("{0}")]
    Other(String),
}

/// Bad configuration values. Unparseable input is reported, never defaulted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("invalid aggregator URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
