//! Document fetchers
//!
//! The caches never talk to the network themselves; they ask a
//! [`DocumentFetcher`] for a readable body. [`HttpFetcher`] does a blocking
//! HTTP GET, [`StaticFetcher`] serves documents registered in memory, which is
//! what tests and captured fixtures use.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Cursor};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;
use url::Url;

use crate::error::{CacheError, Result};

/// Default timeout for description requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default `User-Agent` sent with description requests
pub const DEFAULT_USER_AGENT: &str = concat!("upnp-sdk/", env!("CARGO_PKG_VERSION"), " UPnP/1.1");

/// Source of description documents
pub trait DocumentFetcher: Send + Sync {
    /// Open the document at `url` for reading
    fn fetch(&self, url: &Url) -> Result<Box<dyn BufRead + Send>>;
}

/// Fetches documents over HTTP with a blocking `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and user agent
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(CacheError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Box<dyn BufRead + Send>> {
        debug!(url = %url, "Fetching description document");
        let http_error = |source| CacheError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?;

        Ok(Box::new(BufReader::new(response)))
    }
}

/// Serves documents registered in memory, keyed by absolute URL
#[derive(Debug, Default)]
pub struct StaticFetcher {
    documents: RwLock<HashMap<String, String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the document served at `url`
    pub fn insert(&self, url: &Url, body: impl Into<String>) {
        self.documents.write().insert(url.to_string(), body.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_document(self, url: &Url, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn remove(&self, url: &Url) -> Option<String> {
        self.documents.write().remove(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentFetcher for StaticFetcher {
    fn fetch(&self, url: &Url) -> Result<Box<dyn BufRead + Send>> {
        match self.documents.read().get(url.as_str()) {
            Some(body) => Ok(Box::new(Cursor::new(body.clone().into_bytes()))),
            None => Err(CacheError::NotFound(url.to_string())),
        }
    }
}
