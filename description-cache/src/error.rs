//! Error types for description fetching and caching

use thiserror::Error;
use upnp_description::DescriptionError;

/// Errors raised while fetching or parsing a description document
///
/// Cache lookups swallow these (after logging them) and report a miss; the
/// fetchers and the `*_with` cache entry points return them to the caller.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The HTTP request failed or returned a non-success status
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The fetcher has no document for the URL
    #[error("No document available at {0}")]
    NotFound(String),

    /// The document could not be parsed as a description
    #[error("Description error: {0}")]
    Description(#[from] DescriptionError),

    /// A URL in the document could not be resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The fetched document describes a different device than requested
    #[error("Expected description of {expected}, got {found}")]
    UdnMismatch { expected: String, found: String },

    /// The service does not belong to the given root description
    #[error("Service {service_id} is not part of device {udn}")]
    UnknownService { udn: String, service_id: String },

    /// Failed to build the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
