//! Root description documents
//!
//! A root description is the document a device advertises through its
//! discovery `LOCATION`: a `<root>` element with the UPnP spec version, an
//! optional `URLBase` and exactly one root `<device>`.

use std::io::BufRead;

use url::Url;

use crate::device::{DeviceDescription, DeviceServiceDescription};
use crate::error::{DescriptionError, Result};
use crate::node::{Description, DescriptionNode, NoChildren};
use crate::reader::DescriptionReader;
use crate::urls;

/// `<specVersion>` of a root or SCPD document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecVersion {
    node: DescriptionNode,
}

impl SpecVersion {
    pub fn major(&self) -> i64 {
        self.node.get_int("major", 1)
    }

    pub fn minor(&self) -> i64 {
        self.node.get_int("minor", 0)
    }
}

impl Description for SpecVersion {
    const ELEMENT: &'static str = "specVersion";
    const PROPERTIES: &'static [&'static str] = &["major", "minor"];
    type Child = NoChildren;

    fn empty() -> Self {
        Self::default()
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(_name: &str) -> Option<NoChildren> {
        None
    }

    fn read_child<R: BufRead>(&mut self, child: NoChildren, _: &mut DescriptionReader<R>) -> Result<()> {
        match child {}
    }
}

/// Structured children of a `<root>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootChild {
    SpecVersion,
    Device,
}

/// A parsed root description document
#[derive(Debug, Clone, PartialEq)]
pub struct RootDescription {
    node: DescriptionNode,
    spec_version: SpecVersion,
    device: DeviceDescription,
    has_device: bool,
    document_url: Option<Url>,
}

impl RootDescription {
    /// Parse a root description from a byte stream
    ///
    /// `document_url` is where the document was fetched from; it is the
    /// fallback base for relative URLs inside the document.
    pub fn from_reader<R: BufRead>(source: R, document_url: Option<Url>) -> Result<Self> {
        let mut reader = DescriptionReader::new(source);
        reader.move_to_content()?;
        let mut root = Self::read_from(&mut reader)?;
        root.document_url = document_url;
        Ok(root)
    }

    /// Parse a root description held in memory
    pub fn from_str(xml: &str, document_url: Option<Url>) -> Result<Self> {
        Self::from_reader(xml.as_bytes(), document_url)
    }

    pub fn spec_version(&self) -> &SpecVersion {
        &self.spec_version
    }

    /// The root device
    pub fn device(&self) -> &DeviceDescription {
        &self.device
    }

    /// UDN of the root device, the caching identity of this document
    pub fn udn(&self) -> &str {
        self.device().udn()
    }

    pub fn document_url(&self) -> Option<&Url> {
        self.document_url.as_ref()
    }

    /// Explicit `URLBase`, if the document declares one
    pub fn url_base(&self) -> Option<&str> {
        self.node
            .property("URLBase")
            .map(str::trim)
            .filter(|base| !base.is_empty())
    }

    /// Base for relative URLs in this document
    ///
    /// `None` when there is neither a document URL nor an absolute `URLBase`.
    pub fn base_url(&self) -> Option<Url> {
        match (&self.document_url, self.url_base()) {
            (Some(document), base) => urls::base_url(document, base).ok(),
            (None, Some(base)) => Url::parse(base)
                .ok()
                .and_then(|absolute| urls::base_url(&absolute, Some(base)).ok()),
            (None, None) => None,
        }
    }

    /// Resolve a URL found in this document to an absolute URL
    pub fn resolve_url(&self, reference: &str) -> Result<Url> {
        match self.base_url() {
            Some(base) => urls::resolve(&base, reference),
            None => Ok(Url::parse(reference.trim())?),
        }
    }

    /// Absolute SCPD URL of one of this document's services
    pub fn scpd_url(&self, service: &DeviceServiceDescription) -> Result<Url> {
        self.resolve_url(service.scpd_url())
    }

    /// The root device or one of its embedded devices
    pub fn find_device(&self, udn: &str) -> Option<&DeviceDescription> {
        self.device().find_device(udn)
    }

    /// Every device in the document, root first
    pub fn all_devices(&self) -> Vec<&DeviceDescription> {
        self.device().all_devices()
    }
}

impl Description for RootDescription {
    const ELEMENT: &'static str = "root";
    const PROPERTIES: &'static [&'static str] = &["URLBase", "@configId"];
    type Child = RootChild;

    fn empty() -> Self {
        Self {
            node: DescriptionNode::new(),
            spec_version: SpecVersion::default(),
            device: DeviceDescription::empty(),
            has_device: false,
            document_url: None,
        }
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(name: &str) -> Option<RootChild> {
        match name {
            "specVersion" => Some(RootChild::SpecVersion),
            "device" => Some(RootChild::Device),
            _ => None,
        }
    }

    fn read_child<R: BufRead>(&mut self, child: RootChild, reader: &mut DescriptionReader<R>) -> Result<()> {
        match child {
            RootChild::SpecVersion => self.spec_version.append_from(reader),
            RootChild::Device => {
                if self.has_device {
                    return Err(DescriptionError::structure("a single root <device>", "a second <device>"));
                }
                self.device = DeviceDescription::read_from(reader)?;
                self.has_device = true;
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        if !self.has_device {
            return Err(DescriptionError::structure("<device>", "</root>"));
        }
        Ok(())
    }
}
