//! SSDP-driven discovery
//!
//! [`SsdpSearch`] connects the SSDP transport to the fan-out engine: each
//! responding device's root description is resolved through the shared
//! [`RootDescriptionCache`], wrapped in a [`DescribedDevice`] and fanned out.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use description_cache::RootDescriptionCache;
use tracing::{debug, warn};
use url::Url;

use crate::described::DescribedDevice;
use crate::event::DeviceEvent;
use crate::fanout::FanOut;
use crate::handle::InterfaceOrigin;
use crate::ssdp::{SsdpClient, SsdpResponse};

/// A device location to resolve, with the UDN it is cached under
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    location: String,
    udn: String,
    is_root: bool,
}

/// Iterator that discovers devices and yields fan-out notifications
///
/// Responses are deduplicated by location, then by root device UDN. After
/// the last device a single [`DeviceEvent::SearchComplete`] is yielded.
///
/// Every response is treated as a device that is present. The socket path
/// only sees what [`parse_ssdp_response`](crate::ssdp::parse_ssdp_response)
/// accepts, which drops `ssdp:byebye` announcements; responses passed to
/// [`SsdpSearch::from_responses`] are taken as found.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use description_cache::{HttpFetcher, RootDescriptionCache};
/// use upnp_discovery::{DeviceEvent, FanOut, FindOptions, SsdpClient, SsdpSearch};
///
/// let cache = Arc::new(RootDescriptionCache::new(Arc::new(HttpFetcher::new().unwrap())));
/// let client = SsdpClient::new(Duration::from_secs(3)).unwrap();
/// let search = SsdpSearch::new(client, "upnp:rootdevice", cache, FanOut::new(FindOptions::everything()));
///
/// for event in search {
///     if let DeviceEvent::DeviceAdded { device, .. } = event {
///         println!("Found {} ({})", device.friendly_name, device.udn);
///     }
/// }
/// ```
pub struct SsdpSearch {
    client: Option<SsdpClient>,
    search_target: String,
    cache: Arc<RootDescriptionCache>,
    fan_out: FanOut,
    origin: InterfaceOrigin,
    candidates: VecDeque<Candidate>,
    pending: VecDeque<DeviceEvent>,
    seen_roots: HashSet<String>,
    completed: bool,
}

impl SsdpSearch {
    /// Search with `client`; the M-SEARCH is sent on the first `next()`
    pub fn new(
        client: SsdpClient,
        search_target: impl Into<String>,
        cache: Arc<RootDescriptionCache>,
        fan_out: FanOut,
    ) -> Self {
        let origin = client.origin();
        Self {
            client: Some(client),
            search_target: search_target.into(),
            cache,
            fan_out,
            origin,
            candidates: VecDeque::new(),
            pending: VecDeque::new(),
            seen_roots: HashSet::new(),
            completed: false,
        }
    }

    /// Process responses collected elsewhere (a capture, another transport)
    pub fn from_responses(
        responses: impl IntoIterator<Item = SsdpResponse>,
        origin: InterfaceOrigin,
        cache: Arc<RootDescriptionCache>,
        fan_out: FanOut,
    ) -> Self {
        Self {
            client: None,
            search_target: String::new(),
            cache,
            fan_out,
            origin,
            candidates: candidates(responses).into(),
            pending: VecDeque::new(),
            seen_roots: HashSet::new(),
            completed: false,
        }
    }

    /// An iterator that only yields `SearchComplete`
    ///
    /// Used when the transport could not be set up.
    pub fn empty(cache: Arc<RootDescriptionCache>, fan_out: FanOut) -> Self {
        Self::from_responses(Vec::new(), InterfaceOrigin::default(), cache, fan_out)
    }

    fn fill_candidates(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        match client.search(&self.search_target) {
            Ok(responses) => {
                let responses: Vec<SsdpResponse> = responses
                    .filter_map(|response| match response {
                        Ok(response) => Some(response),
                        Err(e) => {
                            warn!(error = %e, "SSDP receive failed");
                            None
                        }
                    })
                    .collect();
                debug!(count = responses.len(), "SSDP search finished");
                self.candidates = candidates(responses).into();
            }
            Err(e) => warn!(error = %e, "Failed to start SSDP search"),
        }
    }

    /// Resolve one candidate and queue its notifications
    fn process(&mut self, candidate: Candidate) {
        let location = match Url::parse(&candidate.location) {
            Ok(location) => location,
            Err(e) => {
                warn!(location = %candidate.location, error = %e, "Ignoring device with invalid location");
                return;
            }
        };

        let Some(root) = self.cache.get_or_fetch(&candidate.udn, &location) else {
            return;
        };
        if !self.seen_roots.insert(root.udn().to_string()) {
            debug!(udn = %root.udn(), location = %location, "Device already reported at another location");
            return;
        }
        if !candidate.is_root {
            debug!(udn = %candidate.udn, root = %root.udn(), "Found embedded device, reporting its root");
        }

        let device = DescribedDevice::root(root);
        let pending = &mut self.pending;
        self.fan_out
            .run(&device, &self.origin, &mut |event: DeviceEvent| pending.push_back(event));
    }
}

/// One candidate per location, in first-seen order
///
/// A location's `upnp:rootdevice` response decides its UDN; otherwise the
/// first response for it does.
fn candidates(responses: impl IntoIterator<Item = SsdpResponse>) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    for response in responses {
        let udn = response.udn();
        if udn.is_empty() {
            continue;
        }
        let is_root = response.is_root_device();
        match out.iter_mut().find(|c| c.location == response.location) {
            Some(existing) => {
                if is_root && !existing.is_root {
                    existing.udn = udn.to_string();
                    existing.is_root = true;
                }
            }
            None => out.push(Candidate {
                location: response.location.clone(),
                udn: udn.to_string(),
                is_root,
            }),
        }
    }
    out
}

impl Iterator for SsdpSearch {
    type Item = DeviceEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.client.is_some() {
            self.fill_candidates();
        }

        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.candidates.pop_front() {
                Some(candidate) => self.process(candidate),
                None if !self.completed => {
                    self.completed = true;
                    return Some(DeviceEvent::SearchComplete);
                }
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(location: &str, st: &str, usn: &str) -> SsdpResponse {
        SsdpResponse {
            location: location.to_string(),
            search_target: st.to_string(),
            usn: usn.to_string(),
            server: None,
            from: None,
        }
    }

    #[test]
    fn test_candidates_prefer_root_device_udn() {
        let found = candidates(vec![
            response("http://a/desc.xml", "urn:x:device:Child:1", "uuid:child::urn:x:device:Child:1"),
            response("http://a/desc.xml", "upnp:rootdevice", "uuid:root::upnp:rootdevice"),
            response("http://b/desc.xml", "uuid:other", "uuid:other"),
            response("http://a/desc.xml", "uuid:root", "uuid:root"),
        ]);

        assert_eq!(
            found,
            vec![
                Candidate {
                    location: "http://a/desc.xml".to_string(),
                    udn: "uuid:root".to_string(),
                    is_root: true,
                },
                Candidate {
                    location: "http://b/desc.xml".to_string(),
                    udn: "uuid:other".to_string(),
                    is_root: false,
                },
            ]
        );
    }

    #[test]
    fn test_candidates_skip_responses_without_udn() {
        let found = candidates(vec![response("http://a/desc.xml", "upnp:rootdevice", "")]);
        assert!(found.is_empty());
    }
}
