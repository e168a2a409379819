//! Test helpers: scripted device trees and fixture loading

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use upnp_discovery::{DeviceEvent, DeviceHandle, DiscoveryError, Result, ServiceHandle, SsdpResponse};

/// Load a fixture from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

/// A child slot of a [`MockDevice`]: a device, or an entry that fails to read
pub enum MockChild {
    Device(Arc<MockDevice>),
    Broken,
}

/// Scripted transport handle with optional enumeration failures
pub struct MockDevice {
    udn: String,
    root_udn: String,
    services: Vec<String>,
    children: Vec<MockChild>,
    services_fail: bool,
    children_fail: bool,
}

impl MockDevice {
    pub fn new(udn: &str, root_udn: &str) -> Self {
        Self {
            udn: udn.to_string(),
            root_udn: root_udn.to_string(),
            services: Vec::new(),
            children: Vec::new(),
            services_fail: false,
            children_fail: false,
        }
    }

    pub fn with_service(mut self, service_type: &str) -> Self {
        self.services.push(service_type.to_string());
        self
    }

    pub fn with_child(mut self, child: MockDevice) -> Self {
        self.children.push(MockChild::Device(Arc::new(child)));
        self
    }

    pub fn with_broken_child(mut self) -> Self {
        self.children.push(MockChild::Broken);
        self
    }

    pub fn failing_services(mut self) -> Self {
        self.services_fail = true;
        self
    }

    pub fn failing_children(mut self) -> Self {
        self.children_fail = true;
        self
    }
}

impl DeviceHandle for MockDevice {
    fn udn(&self) -> &str {
        &self.udn
    }

    fn root_udn(&self) -> &str {
        &self.root_udn
    }

    fn device_type(&self) -> &str {
        "urn:schemas-upnp-org:device:Mock:1"
    }

    fn friendly_name(&self) -> &str {
        &self.udn
    }

    fn services(&self) -> Result<Vec<Result<ServiceHandle>>> {
        if self.services_fail {
            return Err(DiscoveryError::Enumeration {
                udn: self.udn.clone(),
                reason: "service list unavailable".to_string(),
            });
        }
        Ok(self
            .services
            .iter()
            .enumerate()
            .map(|(i, service_type)| {
                Ok(ServiceHandle::new(
                    service_type.clone(),
                    format!("urn:upnp-org:serviceId:{}-{}", self.udn, i),
                    self.udn.clone(),
                ))
            })
            .collect())
    }

    fn children(&self) -> Result<Vec<Result<Arc<dyn DeviceHandle>>>> {
        if self.children_fail {
            return Err(DiscoveryError::Enumeration {
                udn: self.udn.clone(),
                reason: "child list unavailable".to_string(),
            });
        }
        Ok(self
            .children
            .iter()
            .map(|child| match child {
                MockChild::Device(device) => {
                    let device: Arc<dyn DeviceHandle> = device.clone();
                    Ok(device)
                }
                MockChild::Broken => Err(DiscoveryError::Enumeration {
                    udn: self.udn.clone(),
                    reason: "child handle went away".to_string(),
                }),
            })
            .collect())
    }
}

/// UDNs of the `DeviceAdded` notifications, in order
pub fn added_devices(events: &[DeviceEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::DeviceAdded { device, .. } => Some(device.udn.clone()),
            _ => None,
        })
        .collect()
}

/// Service types of the `ServiceAdded` notifications, in order
pub fn added_services(events: &[DeviceEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::ServiceAdded { service, .. } => Some(service.service_type.clone()),
            _ => None,
        })
        .collect()
}

/// An SSDP search response for a device at `location`
pub fn ssdp_response(location: &str, search_target: &str, udn: &str) -> SsdpResponse {
    let usn = if search_target.starts_with("uuid:") {
        udn.to_string()
    } else {
        format!("{}::{}", udn, search_target)
    };
    SsdpResponse {
        location: location.to_string(),
        search_target: search_target.to_string(),
        usn,
        server: Some("Linux/5.4 UPnP/1.1 test/1.0".to_string()),
        from: None,
    }
}
