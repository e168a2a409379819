//! # UPnP SDK
//!
//! Sync-first toolkit for finding UPnP devices and reading what they offer:
//!
//! ```rust,no_run
//! use upnp_sdk::{logging, SdkConfig, UpnpSystem};
//! use upnp_discovery::DeviceEvent;
//!
//! fn main() -> Result<(), upnp_sdk::SdkError> {
//!     logging::init_logging_from_env().ok();
//!
//!     let system = UpnpSystem::new(SdkConfig::from_env()?)?;
//!     for event in system.search()? {
//!         match event {
//!             DeviceEvent::DeviceAdded { device, origin } => {
//!                 println!("{} {} via {}", device.udn, device.friendly_name, origin)
//!             }
//!             DeviceEvent::ServiceAdded { service, .. } => println!("  {}", service.service_type),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! upnp-sdk (UpnpSystem, configuration, logging)
//!     ↓
//! upnp-discovery (SSDP search, policy-driven fan-out)
//!     ↓
//! description-cache (single-flight root and SCPD caches)
//!     ↓
//! upnp-description (streaming description parser)
//! ```

pub use config::SdkConfig;
pub use error::{Result, SdkError};
pub use system::UpnpSystem;

pub use description_cache::{DocumentFetcher, HttpFetcher, StaticFetcher};
pub use upnp_description::{DeviceDescription, RootDescription, ServiceDescription};
pub use upnp_discovery::{
    DeviceEvent, DeviceFindOption, DeviceHandle, FindOptions, InterfaceOrigin, ServiceFindOption,
};

pub mod config;
pub mod logging;

mod error;
mod system;
