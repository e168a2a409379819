//! # upnp-description
//!
//! Streaming parser for UPnP description documents: the root device
//! description a device advertises on the network, and the SCPD documents
//! describing each of its services.
//!
//! Every parsed element keeps its raw leaf values in an ordered property bag,
//! so vendor extensions survive parsing and can be inspected through
//! [`Description::unused_properties`].
//!
//! ## Usage
//!
//! ```rust
//! use upnp_description::{Description, RootDescription};
//! use url::Url;
//!
//! let xml = r#"<root xmlns="urn:schemas-upnp-org:device-1-0">
//!   <specVersion><major>1</major><minor>0</minor></specVersion>
//!   <device>
//!     <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
//!     <friendlyName>Kitchen</friendlyName>
//!     <UDN>uuid:kitchen-1</UDN>
//!     <roomName>Kitchen</roomName>
//!   </device>
//! </root>"#;
//!
//! let location = Url::parse("http://192.168.1.30:1400/xml/device_description.xml").unwrap();
//! let root = RootDescription::from_str(xml, Some(location)).unwrap();
//!
//! assert_eq!(root.udn(), "uuid:kitchen-1");
//! assert_eq!(root.device().friendly_name(), "Kitchen");
//! assert_eq!(root.device().unused_properties(), vec![("roomName", "Kitchen")]);
//! ```

pub mod collection;
pub mod device;
pub mod error;
pub mod node;
pub mod ordered_map;
pub mod reader;
pub mod root;
pub mod service;
pub mod urls;

pub use collection::{is_synthetic_key, DescriptionDictionary, DescriptionList, KeyedDescription};
pub use device::{service_cache_key, DeviceDescription, DeviceServiceDescription, IconDescription};
pub use error::{DescriptionError, Result};
pub use node::{declared_properties, Description, DescriptionNode};
pub use ordered_map::{DuplicateKeyError, OrderedMap};
pub use reader::{DescriptionReader, Token};
pub use root::{RootDescription, SpecVersion};
pub use service::{
    ActionDescription, AllowedValueRange, ArgumentDescription, ArgumentDirection, ServiceDescription,
    StateVariableDescription,
};
