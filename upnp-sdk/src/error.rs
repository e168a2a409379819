use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Description error: {0}")]
    Description(#[from] upnp_description::DescriptionError),

    #[error("Cache error: {0}")]
    Cache(#[from] description_cache::CacheError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] upnp_discovery::DiscoveryError),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;
