//! Error types for the discovery system

use description_cache::CacheError;
use thiserror::Error;

/// Errors raised by discovery transports and device handles
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Socket creation, send or receive failed
    #[error("Network error: {context}: {source}")]
    Network {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A discovery response could not be understood
    #[error("Invalid discovery response: {0}")]
    InvalidResponse(String),

    /// A device's children or services could not be enumerated
    #[error("Enumeration of {udn} failed: {reason}")]
    Enumeration { udn: String, reason: String },

    /// A description could not be fetched or parsed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A URL reported by a device is not usable
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DiscoveryError {
    pub(crate) fn network(context: &'static str, source: std::io::Error) -> Self {
        DiscoveryError::Network { context, source }
    }
}

/// Convenience Result type alias for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;
