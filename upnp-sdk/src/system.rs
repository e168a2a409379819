//! UpnpSystem - main entry point for the SDK
//!
//! Owns the document fetcher and both description caches, and wires them to
//! the discovery fan-out. Everything is synchronous.

use std::sync::Arc;

use description_cache::{
    DocumentFetcher, HttpFetcher, RootDescriptionCache, ServiceDescriptionCache,
};
use tracing::{debug, info};
use upnp_description::{DeviceServiceDescription, RootDescription, ServiceDescription};
use upnp_discovery::{
    DescribedDevice, DeviceEvent, DeviceHandle, EventSink, FanOut, InterfaceOrigin, SsdpClient,
    SsdpResponse, SsdpSearch,
};
use url::Url;

use crate::config::SdkConfig;
use crate::error::{Result, SdkError};

/// Main system entry point
///
/// # Example
///
/// ```rust,no_run
/// use upnp_sdk::{SdkConfig, UpnpSystem};
/// use upnp_discovery::DeviceEvent;
///
/// fn main() -> Result<(), upnp_sdk::SdkError> {
///     let system = UpnpSystem::new(SdkConfig::root_devices())?;
///
///     for event in system.search()? {
///         if let DeviceEvent::ServiceAdded { service, .. } = event {
///             println!("{} on {}", service.service_type, service.device_udn);
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct UpnpSystem {
    config: SdkConfig,
    fan_out: FanOut,
    roots: Arc<RootDescriptionCache>,
    services: Arc<ServiceDescriptionCache>,
}

impl UpnpSystem {
    /// Create a system that fetches descriptions over HTTP
    pub fn new(config: SdkConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::with_options(config.http_timeout, &config.user_agent)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a system that loads descriptions through `fetcher`
    pub fn with_fetcher(config: SdkConfig, fetcher: Arc<dyn DocumentFetcher>) -> Result<Self> {
        config.validate()?;
        debug!(
            search_target = %config.search_target,
            device_option = ?config.find_options.device,
            service_option = ?config.find_options.service,
            "Creating UPnP system"
        );
        Ok(Self {
            fan_out: FanOut::new(config.find_options.clone()),
            roots: Arc::new(RootDescriptionCache::new(Arc::clone(&fetcher))),
            services: Arc::new(ServiceDescriptionCache::new(fetcher)),
            config,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Start an SSDP search; events are produced as the iterator is driven
    pub fn search_iter(&self) -> Result<SsdpSearch> {
        let client = SsdpClient::new(self.config.search_timeout)?
            .with_mx(self.config.mx)
            .with_user_agent(self.config.user_agent.clone());
        Ok(SsdpSearch::new(
            client,
            self.config.search_target.clone(),
            Arc::clone(&self.roots),
            self.fan_out.clone(),
        ))
    }

    /// Run an SSDP search to completion
    ///
    /// The last event is always [`DeviceEvent::SearchComplete`].
    pub fn search(&self) -> Result<Vec<DeviceEvent>> {
        let events: Vec<DeviceEvent> = self.search_iter()?.collect();
        info!(
            devices = events.iter().filter(|e| e.is_device_added()).count(),
            services = events.iter().filter(|e| e.is_service_added()).count(),
            "Search complete"
        );
        Ok(events)
    }

    /// Process SSDP responses obtained elsewhere as if they came from a search
    pub fn process_responses(
        &self,
        responses: impl IntoIterator<Item = SsdpResponse>,
        origin: InterfaceOrigin,
    ) -> Vec<DeviceEvent> {
        SsdpSearch::from_responses(responses, origin, Arc::clone(&self.roots), self.fan_out.clone()).collect()
    }

    /// Root description of `udn`, fetched from `location` on a miss
    pub fn root_description(&self, udn: &str, location: &Url) -> Result<Arc<RootDescription>> {
        Ok(self.roots.try_get_or_fetch(udn, location)?)
    }

    /// SCPD of `service`, resolved against `root` and fetched on a miss
    pub fn service_description(
        &self,
        root: &RootDescription,
        service: &DeviceServiceDescription,
    ) -> Result<Arc<ServiceDescription>> {
        Ok(self.services.try_get_or_fetch(root, service)?)
    }

    /// SCPD of the service `service_id` on device `udn` of a cached root
    pub fn service_description_by_id(
        &self,
        root_udn: &str,
        udn: &str,
        service_id: &str,
    ) -> Result<Arc<ServiceDescription>> {
        let root = self
            .roots
            .get(root_udn)
            .ok_or_else(|| SdkError::DeviceNotFound(root_udn.to_string()))?;
        let service = root
            .find_device(udn)
            .and_then(|device| device.service(service_id))
            .ok_or_else(|| {
                SdkError::Cache(description_cache::CacheError::UnknownService {
                    udn: udn.to_string(),
                    service_id: service_id.to_string(),
                })
            })?;
        self.service_description(&root, service)
    }

    /// Run the configured fan-out over a device reported by any transport
    pub fn fan_out(&self, device: &dyn DeviceHandle, origin: &InterfaceOrigin, sink: &mut dyn EventSink) {
        self.fan_out.run(device, origin, sink);
    }

    /// Fan out over a cached root description
    pub fn fan_out_cached(&self, root_udn: &str, origin: &InterfaceOrigin) -> Result<Vec<DeviceEvent>> {
        let root = self
            .roots
            .get(root_udn)
            .ok_or_else(|| SdkError::DeviceNotFound(root_udn.to_string()))?;
        Ok(self.fan_out.collect(&DescribedDevice::root(root), origin))
    }

    pub fn root_cache(&self) -> &Arc<RootDescriptionCache> {
        &self.roots
    }

    pub fn service_cache(&self) -> &Arc<ServiceDescriptionCache> {
        &self.services
    }

    /// Drop everything cached for the device tree rooted at `udn`
    ///
    /// Returns whether a root description was cached for it. Service
    /// descriptions of `udn` itself are dropped either way.
    pub fn forget_device(&self, udn: &str) -> bool {
        let root = self.roots.invalidate(udn);
        let mut udns: Vec<String> = root
            .as_ref()
            .map(|root| root.all_devices().iter().map(|d| d.udn().to_string()).collect())
            .unwrap_or_default();
        if !udns.iter().any(|known| known == udn) {
            udns.push(udn.to_string());
        }

        let removed: usize = udns.iter().map(|known| self.services.invalidate_device(known)).sum();
        debug!(udn = %udn, root = root.is_some(), services = removed, "Forgot device");
        root.is_some()
    }
}

impl std::fmt::Debug for UpnpSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpnpSystem")
            .field("config", &self.config)
            .field("roots", &self.roots.len())
            .field("services", &self.services.len())
            .finish()
    }
}
