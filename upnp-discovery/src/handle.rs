//! Transport-facing device and service handles
//!
//! A discovery transport reports each found device as a [`DeviceHandle`].
//! The fan-out engine only ever reads devices through this trait, so any
//! transport (SSDP, a native stack, a test double) can drive it.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Network interface a discovery event arrived on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InterfaceOrigin {
    /// Interface index as reported by the transport, 0 when unknown
    pub index: u32,
    /// Local address of that interface
    pub address: Option<IpAddr>,
}

impl InterfaceOrigin {
    pub fn new(index: u32, address: Option<IpAddr>) -> Self {
        Self { index, address }
    }
}

impl fmt::Display for InterfaceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(address) => write!(f, "if{}/{}", self.index, address),
            None => write!(f, "if{}", self.index),
        }
    }
}

/// A service exposed by a discovered device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHandle {
    pub service_type: String,
    pub service_id: String,
    /// UDN of the device that exposes the service
    pub device_udn: String,
}

impl ServiceHandle {
    pub fn new(
        service_type: impl Into<String>,
        service_id: impl Into<String>,
        device_udn: impl Into<String>,
    ) -> Self {
        Self {
            service_type: service_type.into(),
            service_id: service_id.into(),
            device_udn: device_udn.into(),
        }
    }
}

/// A device as reported by a discovery transport
///
/// The two enumerations can fail as a whole (`Err` on the outer result) or
/// per item (`Err` entries); the fan-out engine tolerates both.
pub trait DeviceHandle: Send + Sync {
    fn udn(&self) -> &str;

    /// UDN of the root device of the tree this device belongs to
    fn root_udn(&self) -> &str;

    fn device_type(&self) -> &str;

    fn friendly_name(&self) -> &str;

    /// URL of the root description document, when the transport knows it
    fn document_url(&self) -> Option<&str> {
        None
    }

    /// Services declared directly on this device
    fn services(&self) -> Result<Vec<Result<ServiceHandle>>>;

    /// Devices embedded directly in this device
    fn children(&self) -> Result<Vec<Result<Arc<dyn DeviceHandle>>>>;
}

/// Snapshot of a device's identity carried by notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub udn: String,
    pub root_udn: String,
    pub device_type: String,
    pub friendly_name: String,
    pub document_url: Option<String>,
}

impl DeviceInfo {
    pub fn is_root(&self) -> bool {
        self.udn == self.root_udn
    }
}

impl From<&dyn DeviceHandle> for DeviceInfo {
    fn from(device: &dyn DeviceHandle) -> Self {
        Self {
            udn: device.udn().to_string(),
            root_udn: device.root_udn().to_string(),
            device_type: device.device_type().to_string(),
            friendly_name: device.friendly_name().to_string(),
            document_url: device.document_url().map(str::to_string),
        }
    }
}
