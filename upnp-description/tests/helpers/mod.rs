//! Test helpers for fixture-based description tests

use std::fs;
use std::path::PathBuf;

use url::Url;

/// A description document loaded from `tests/fixtures`
#[derive(Debug, Clone)]
pub struct DescriptionFixture {
    pub name: String,
    pub ip: String,
    pub xml_content: String,
}

impl DescriptionFixture {
    /// Load a fixture from the fixtures directory
    pub fn load(filename: &str, ip: &str) -> Self {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures");
        path.push(filename);

        let xml_content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e));

        Self {
            name: filename.to_string(),
            ip: ip.to_string(),
            xml_content,
        }
    }

    /// URL the document would have been fetched from
    pub fn location_url(&self) -> Url {
        Url::parse(&format!("http://{}:49152/rootDesc.xml", self.ip)).unwrap()
    }
}

pub fn igd_root() -> DescriptionFixture {
    DescriptionFixture::load("igd_root.xml", "192.168.1.1")
}

pub fn media_renderer() -> DescriptionFixture {
    DescriptionFixture::load("media_renderer.xml", "192.168.1.40")
}

pub fn wanipcn() -> DescriptionFixture {
    DescriptionFixture::load("wanipcn.xml", "192.168.1.1")
}
