//! # description-cache
//!
//! Two-level memoizing cache for UPnP descriptions: root descriptions keyed
//! by device UDN and service descriptions keyed by `UDN|serviceId` (with a
//! secondary index on the resolved SCPD URL).
//!
//! Caches are plain values: construct them with a [`DocumentFetcher`] and
//! share them with `Arc`. Concurrent lookups of the same key run a single
//! fetch; failed fetches are never stored.
//!
//! ```rust
//! use std::sync::Arc;
//! use description_cache::{RootDescriptionCache, StaticFetcher};
//! use url::Url;
//!
//! let location = Url::parse("http://192.168.1.1:49152/rootDesc.xml").unwrap();
//! let fetcher = StaticFetcher::new().with_document(
//!     &location,
//!     "<root><device><UDN>uuid:gateway</UDN></device></root>",
//! );
//!
//! let cache = RootDescriptionCache::new(Arc::new(fetcher));
//! let root = cache.get_or_fetch("uuid:gateway", &location).unwrap();
//! assert_eq!(root.udn(), "uuid:gateway");
//! assert!(Arc::ptr_eq(&root, &cache.get("uuid:gateway").unwrap()));
//! ```

pub mod error;
pub mod fetch;
pub mod flight;
pub mod root;
pub mod service;

pub use error::{CacheError, Result};
pub use fetch::{DocumentFetcher, HttpFetcher, StaticFetcher, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT};
pub use flight::FlightCache;
pub use root::RootDescriptionCache;
pub use service::ServiceDescriptionCache;
