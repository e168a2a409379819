//! Test helpers: a gateway served from fixtures

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use upnp_sdk::{SdkConfig, StaticFetcher, UpnpSystem};
use url::Url;

pub const GATEWAY_UDN: &str = "uuid:igd-0000-0000-0000-000000000001";
pub const CONNECTION_UDN: &str = "uuid:igd-0000-0000-0000-000000000003";
pub const WANIP_SERVICE_ID: &str = "urn:upnp-org:serviceId:WANIPConn1";

/// Load a fixture from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

pub fn gateway_location() -> Url {
    Url::parse("http://192.168.1.1:49152/rootDesc.xml").unwrap()
}

/// Fetcher serving the gateway's root description and two of its SCPDs
pub fn gateway_fetcher() -> Arc<StaticFetcher> {
    let base = Url::parse("http://192.168.1.1:49152/upnp/").unwrap();
    Arc::new(
        StaticFetcher::new()
            .with_document(&gateway_location(), load_fixture("igd_root.xml"))
            .with_document(&base.join("wanipcn.xml").unwrap(), load_fixture("wanipcn.xml"))
            .with_document(&base.join("wancic.xml").unwrap(), load_fixture("wancic.xml")),
    )
}

pub fn system_with(config: SdkConfig, fetcher: Arc<StaticFetcher>) -> UpnpSystem {
    UpnpSystem::with_fetcher(config, fetcher).unwrap()
}
