use thiserror::Error;

use crate::domain::ItemId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    /// The upstream market API could not be reached or answered with a
    /// non-success status. Retryable from the caller's point of view.
    #[error("upstream market API unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream market API answered, but the payload was malformed or
    /// self-reported failure (`success: false`).
    #[error("upstream market data invalid: {0}")]
    UpstreamDataInvalid(String),

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("no recipe found for item: {0}")]
    RecipeNotFound(ItemId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read recipe file: {0}")]
    RecipeFile(#[source] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::UpstreamDataInvalid(e.to_string())
        } else {
            Self::UpstreamUnavailable(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
