//! Cache of service descriptions (SCPD documents)
//!
//! Entries are keyed by `UDN|serviceId`. A secondary index maps the resolved
//! SCPD URL to the same description, so services of different devices that
//! point at one document share a single fetch.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use upnp_description::{service_cache_key, DeviceServiceDescription, RootDescription, ServiceDescription};
use url::Url;

use crate::error::{CacheError, Result};
use crate::fetch::DocumentFetcher;
use crate::flight::FlightCache;

#[derive(Default)]
struct UrlIndex {
    by_url: HashMap<String, Arc<ServiceDescription>>,
    url_of_key: HashMap<String, String>,
}

/// Service descriptions by `UDN|serviceId`, with a URL index
pub struct ServiceDescriptionCache {
    fetcher: Arc<dyn DocumentFetcher>,
    entries: FlightCache<String, Arc<ServiceDescription>>,
    index: Mutex<UrlIndex>,
}

impl ServiceDescriptionCache {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            entries: FlightCache::new(),
            index: Mutex::new(UrlIndex::default()),
        }
    }

    /// The SCPD of `service`, fetching it on a miss
    ///
    /// The SCPD URL is resolved against `root`. Failures are logged and
    /// reported as `None`; nothing is stored for them.
    pub fn get_or_fetch(
        &self,
        root: &RootDescription,
        service: &DeviceServiceDescription,
    ) -> Option<Arc<ServiceDescription>> {
        match self.try_get_or_fetch(root, service) {
            Ok(description) => Some(description),
            Err(e) => {
                warn!(
                    udn = %service.device_udn(),
                    service_id = %service.service_id(),
                    error = %e,
                    "Failed to load service description"
                );
                None
            }
        }
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) but reports the failure
    pub fn try_get_or_fetch(
        &self,
        root: &RootDescription,
        service: &DeviceServiceDescription,
    ) -> Result<Arc<ServiceDescription>> {
        let owner = root
            .find_device(service.device_udn())
            .filter(|device| device.service(service.service_id()).is_some());
        if owner.is_none() {
            return Err(CacheError::UnknownService {
                udn: service.device_udn().to_string(),
                service_id: service.service_id().to_string(),
            });
        }

        let key = service.cache_key();
        let url = root.scpd_url(service)?;
        let description = self.entries.get_or_try_insert_with(&key, || {
            if let Some(shared) = self.get_by_url(&url) {
                debug!(key = %key, url = %url, "Service description shared by URL");
                return Ok(shared);
            }
            debug!(key = %key, url = %url, "Service description cache miss");
            let body = self.fetcher.fetch(&url)?;
            let description = ServiceDescription::from_reader(body, Some(url.clone()))?;
            Ok::<_, CacheError>(Arc::new(description))
        })?;

        self.index_url(&key, &url, &description);
        Ok(description)
    }

    /// Stored description by `UDN|serviceId` key
    pub fn get(&self, key: &str) -> Option<Arc<ServiceDescription>> {
        self.entries.get(&key.to_string())
    }

    /// Stored description of one service of one device
    pub fn get_service(&self, udn: &str, service_id: &str) -> Option<Arc<ServiceDescription>> {
        self.get(&service_cache_key(udn, service_id))
    }

    /// Stored description by resolved SCPD URL
    pub fn get_by_url(&self, url: &Url) -> Option<Arc<ServiceDescription>> {
        self.index.lock().by_url.get(url.as_str()).cloned()
    }

    /// Drop the description stored under `key` and its URL entry
    pub fn invalidate(&self, key: &str) -> Option<Arc<ServiceDescription>> {
        let removed = self.entries.remove(&key.to_string());
        let mut index = self.index.lock();
        if let Some(url) = index.url_of_key.remove(key) {
            index.by_url.remove(&url);
        }
        if removed.is_some() {
            debug!(key = %key, "Service description invalidated");
        }
        removed
    }

    /// Drop every service description of the device `udn`
    ///
    /// Returns the number of descriptions removed.
    pub fn invalidate_device(&self, udn: &str) -> usize {
        let prefix = service_cache_key(udn, "");
        self.entries
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&prefix))
            .filter(|key| self.invalidate(key).is_some())
            .count()
    }

    pub fn clear(&self) {
        self.entries.clear();
        let mut index = self.index.lock();
        index.by_url.clear();
        index.url_of_key.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `url` for `key`, unless `key` was invalidated in the meantime
    fn index_url(&self, key: &str, url: &Url, description: &Arc<ServiceDescription>) {
        let mut index = self.index.lock();
        let stored = self.entries.get(&key.to_string());
        if !stored.is_some_and(|stored| Arc::ptr_eq(&stored, description)) {
            trace!(key = %key, "Skipping URL index update for a replaced entry");
            return;
        }
        index.by_url.insert(url.to_string(), Arc::clone(description));
        index.url_of_key.insert(key.to_string(), url.to_string());
    }
}

impl std::fmt::Debug for ServiceDescriptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptionCache")
            .field("len", &self.len())
            .field("urls", &self.index.lock().by_url.len())
            .finish()
    }
}
