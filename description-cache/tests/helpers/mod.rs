//! Test helpers for cache integration tests

use std::collections::HashMap;
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use description_cache::{DocumentFetcher, Result, StaticFetcher};
use parking_lot::Mutex;
use url::Url;

pub const GATEWAY_UDN: &str = "uuid:igd-0000-0000-0000-000000000001";
pub const WAN_DEVICE_UDN: &str = "uuid:igd-0000-0000-0000-000000000002";
pub const CONNECTION_UDN: &str = "uuid:igd-0000-0000-0000-000000000003";

/// Load a fixture from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn gateway_location() -> Url {
    url("http://192.168.1.1:49152/rootDesc.xml")
}

/// In-memory fetcher that counts requests per URL and can be slowed down
#[derive(Default)]
pub struct CountingFetcher {
    inner: StaticFetcher,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl CountingFetcher {
    /// A fetcher serving the gateway fixture and its SCPD documents
    pub fn gateway() -> Self {
        let fetcher = Self::default();
        fetcher.inner.insert(&gateway_location(), load_fixture("igd_root.xml"));
        fetcher
            .inner
            .insert(&url("http://192.168.1.1:49152/upnp/wanipcn.xml"), load_fixture("wanipcn.xml"));
        fetcher
            .inner
            .insert(&url("http://192.168.1.1:49152/upnp/wancic.xml"), load_fixture("wancic.xml"));
        fetcher
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, url: &Url, body: impl Into<String>) {
        self.inner.insert(url, body);
    }

    pub fn calls(&self, url: &Url) -> usize {
        self.calls.lock().get(url.as_str()).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl DocumentFetcher for CountingFetcher {
    fn fetch(&self, url: &Url) -> Result<Box<dyn BufRead + Send>> {
        *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.inner.fetch(url)
    }
}
