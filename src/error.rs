//! Error handling for the catalog pipeline
//!
//! Data problems in scraped feeds are never errors: they are dropped,
//! counted, and reported through [`crate::report::Diagnostics`]. The types
//! here cover the failures that do stop a run: unreadable files, unparseable
//! documents, and invalid configuration.

use thiserror::Error;

/// Main error type for the catalog pipeline
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid site origin: {0}")]
    SiteOrigin(#[from] url::ParseError),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Feed '{feed}' is malformed: {message}")]
    MalformedFeed { feed: String, message: String },
}

impl CatalogError {
    pub fn config(message: impl Into<String>) -> Self {
        CatalogError::Config {
            message: message.into(),
        }
    }

    pub fn malformed_feed(feed: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::MalformedFeed {
            feed: feed.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
