//! Cache of root device descriptions keyed by UDN

use std::sync::Arc;

use tracing::{debug, warn};
use upnp_description::RootDescription;
use url::Url;

use crate::error::{CacheError, Result};
use crate::fetch::DocumentFetcher;
use crate::flight::FlightCache;

/// Root descriptions by device UDN
///
/// Entries live until they are invalidated; there is no expiry. Concurrent
/// lookups of one UDN share a single fetch.
pub struct RootDescriptionCache {
    fetcher: Arc<dyn DocumentFetcher>,
    entries: FlightCache<String, Arc<RootDescription>>,
}

impl RootDescriptionCache {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            entries: FlightCache::new(),
        }
    }

    /// The description of `udn`, fetching it from `location` on a miss
    ///
    /// Returns `None` (after logging why) when the document cannot be
    /// fetched or parsed, or does not describe `udn`. Nothing is stored in
    /// that case, so a later call tries again.
    pub fn get_or_fetch(&self, udn: &str, location: &Url) -> Option<Arc<RootDescription>> {
        match self.try_get_or_fetch(udn, location) {
            Ok(root) => Some(root),
            Err(e) => {
                warn!(udn = %udn, location = %location, error = %e, "Failed to load root description");
                None
            }
        }
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) but reports the failure
    pub fn try_get_or_fetch(&self, udn: &str, location: &Url) -> Result<Arc<RootDescription>> {
        self.get_or_fetch_with(udn, || {
            debug!(udn = %udn, location = %location, "Root description cache miss");
            let body = self.fetcher.fetch(location)?;
            let root = RootDescription::from_reader(body, Some(location.clone()))?;
            if root.find_device(udn).is_none() {
                return Err(CacheError::UdnMismatch {
                    expected: udn.to_string(),
                    found: root.udn().to_string(),
                });
            }
            Ok(root)
        })
    }

    /// The description of `udn`, produced by `load` on a miss
    ///
    /// This is the hook for transports that obtain documents some other way.
    pub fn get_or_fetch_with<F>(&self, udn: &str, load: F) -> Result<Arc<RootDescription>>
    where
        F: FnOnce() -> Result<RootDescription>,
    {
        self.entries
            .get_or_try_insert_with(&udn.to_string(), || load().map(Arc::new))
    }

    /// The stored description of `udn`, without fetching
    pub fn get(&self, udn: &str) -> Option<Arc<RootDescription>> {
        self.entries.get(&udn.to_string())
    }

    /// Store an already parsed description under its own UDN
    pub fn insert(&self, root: RootDescription) -> Arc<RootDescription> {
        let root = Arc::new(root);
        self.entries.insert(root.udn().to_string(), Arc::clone(&root));
        root
    }

    /// Drop the description of `udn`, returning it if one was stored
    pub fn invalidate(&self, udn: &str) -> Option<Arc<RootDescription>> {
        let removed = self.entries.remove(&udn.to_string());
        if removed.is_some() {
            debug!(udn = %udn, "Root description invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// UDNs with a stored description
    pub fn udns(&self) -> Vec<String> {
        self.entries.keys()
    }
}

impl std::fmt::Debug for RootDescriptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootDescriptionCache")
            .field("len", &self.len())
            .finish()
    }
}
