//! Discover UPnP devices and print every notification as a JSON line
//!
//! Usage: cargo run -p upnp-sdk-discovery --example discover_json [search-target] [seconds]

use std::sync::Arc;
use std::time::Duration;

use description_cache::{HttpFetcher, RootDescriptionCache};
use upnp_discovery::{FanOut, FindOptions, SsdpClient, SsdpSearch};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let search_target = args.next().unwrap_or_else(|| "ssdp:all".to_string());
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);
    let timeout = Duration::from_secs(seconds);

    let cache = Arc::new(RootDescriptionCache::new(Arc::new(HttpFetcher::with_options(
        timeout,
        description_cache::DEFAULT_USER_AGENT,
    )?)));
    let client = SsdpClient::new(timeout)?;
    let search = SsdpSearch::new(client, search_target, cache, FanOut::new(FindOptions::everything()));

    for event in search {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
