//! UPnP device discovery library
//!
//! This crate turns raw "device found" events into policy-filtered device
//! and service notifications, and ships an SSDP transport that feeds it.
//!
//! # Quick Start
//!
//! ```no_run
//! use upnp_discovery::{get, DeviceEvent};
//!
//! // Discover every root device on the network
//! for event in get() {
//!     if let DeviceEvent::DeviceAdded { device, .. } = event {
//!         println!("Found {} ({})", device.friendly_name, device.device_type);
//!     }
//! }
//! ```
//!
//! # Driving the fan-out from another transport
//!
//! Any transport can implement [`DeviceHandle`] and hand found devices to a
//! [`FanOut`] (or a [`DeviceFinder`] for push-style callbacks):
//!
//! ```no_run
//! use upnp_discovery::{DeviceHandle, FanOut, FindOptions, InterfaceOrigin};
//!
//! fn on_found(device: &dyn DeviceHandle) {
//!     let fan_out = FanOut::new(FindOptions::service_type(
//!         "urn:schemas-upnp-org:service:WANIPConnection:1",
//!     ));
//!     for event in fan_out.collect(device, &InterfaceOrigin::default()) {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

mod described;
mod error;
mod event;
mod fanout;
mod finder;
mod handle;
mod policy;
mod search;
pub mod ssdp;

pub use described::DescribedDevice;
pub use error::{DiscoveryError, Result};
pub use event::{DeviceEvent, EventSink};
pub use fanout::FanOut;
pub use finder::DeviceFinder;
pub use handle::{DeviceHandle, DeviceInfo, InterfaceOrigin, ServiceHandle};
pub use policy::{DeviceFindOption, FindOptions, ServiceFindOption};
pub use search::SsdpSearch;
pub use ssdp::{SsdpClient, SsdpResponse};

use std::sync::Arc;
use std::time::Duration;

use description_cache::{HttpFetcher, RootDescriptionCache, StaticFetcher};
use tracing::warn;

/// Discover root devices with a default 3-second timeout
///
/// Collects every notification, ending with `SearchComplete`. For more
/// control use [`get_iter`] or build an [`SsdpSearch`] directly.
pub fn get() -> Vec<DeviceEvent> {
    get_with_timeout(Duration::from_secs(3))
}

/// Discover root devices with a custom timeout
pub fn get_with_timeout(timeout: Duration) -> Vec<DeviceEvent> {
    get_iter_with_timeout(timeout).collect()
}

/// Iterator over discovery notifications with a default 3-second timeout
pub fn get_iter() -> SsdpSearch {
    get_iter_with_timeout(Duration::from_secs(3))
}

/// Iterator over discovery notifications with a custom timeout
///
/// The timeout bounds both the SSDP response window and each description
/// request. Reports root devices and their direct services.
pub fn get_iter_with_timeout(timeout: Duration) -> SsdpSearch {
    let options = FindOptions::new(
        DeviceFindOption::FoundDevicesOnly,
        ServiceFindOption::FoundDeviceDirectChildrenOnly,
    );
    let fan_out = FanOut::new(options);

    let fetcher = match HttpFetcher::with_options(timeout, description_cache::DEFAULT_USER_AGENT) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            warn!(error = %e, "Failed to create HTTP fetcher");
            let cache = Arc::new(RootDescriptionCache::new(Arc::new(StaticFetcher::new())));
            return SsdpSearch::empty(cache, fan_out);
        }
    };
    let cache = Arc::new(RootDescriptionCache::new(Arc::new(fetcher)));

    match SsdpClient::new(timeout) {
        Ok(client) => SsdpSearch::new(client, ssdp::SEARCH_ROOT_DEVICES, cache, fan_out),
        Err(e) => {
            warn!(error = %e, "Failed to create SSDP client");
            SsdpSearch::empty(cache, fan_out)
        }
    }
}
