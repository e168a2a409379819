//! Device handles backed by parsed root descriptions
//!
//! Transports that only learn a device's description URL (SSDP does) wrap the
//! parsed [`RootDescription`] in a [`DescribedDevice`] so the fan-out engine
//! can walk it like any other transport handle.

use std::sync::Arc;

use upnp_description::{DeviceDescription, RootDescription};

use crate::error::Result;
use crate::handle::{DeviceHandle, ServiceHandle};

/// One device inside a shared root description
///
/// The device is addressed by its position in the tree, so embedded devices
/// with missing or repeated UDNs are still reachable.
#[derive(Debug, Clone)]
pub struct DescribedDevice {
    root: Arc<RootDescription>,
    path: Vec<usize>,
}

impl DescribedDevice {
    /// Handle for the root device of `root`
    pub fn root(root: Arc<RootDescription>) -> Self {
        Self { root, path: Vec::new() }
    }

    /// Handle for the first device in `root` whose UDN is `udn`
    pub fn find(root: Arc<RootDescription>, udn: &str) -> Option<Self> {
        let path = path_to(root.device(), udn)?;
        Some(Self { root, path })
    }

    /// The parsed description of this device
    pub fn description(&self) -> &DeviceDescription {
        let mut device = self.root.device();
        for &position in &self.path {
            match device.devices().get_at(position) {
                Some(child) => device = child,
                None => break,
            }
        }
        device
    }

    /// The root description this device belongs to
    pub fn root_description(&self) -> &Arc<RootDescription> {
        &self.root
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

fn path_to(device: &DeviceDescription, udn: &str) -> Option<Vec<usize>> {
    if device.udn() == udn {
        return Some(Vec::new());
    }
    device.devices().values().enumerate().find_map(|(position, child)| {
        path_to(child, udn).map(|mut rest| {
            rest.insert(0, position);
            rest
        })
    })
}

impl DeviceHandle for DescribedDevice {
    fn udn(&self) -> &str {
        self.description().udn()
    }

    fn root_udn(&self) -> &str {
        self.root.udn()
    }

    fn device_type(&self) -> &str {
        self.description().device_type()
    }

    fn friendly_name(&self) -> &str {
        self.description().friendly_name()
    }

    fn document_url(&self) -> Option<&str> {
        self.root.document_url().map(|url| url.as_str())
    }

    fn services(&self) -> Result<Vec<Result<ServiceHandle>>> {
        Ok(self
            .description()
            .services()
            .values()
            .map(|service| {
                Ok(ServiceHandle::new(
                    service.service_type(),
                    service.service_id(),
                    service.device_udn(),
                ))
            })
            .collect())
    }

    fn children(&self) -> Result<Vec<Result<Arc<dyn DeviceHandle>>>> {
        let count = self.description().devices().len();
        Ok((0..count)
            .map(|position| {
                let mut path = self.path.clone();
                path.push(position);
                let child: Arc<dyn DeviceHandle> = Arc::new(DescribedDevice {
                    root: Arc::clone(&self.root),
                    path,
                });
                Ok(child)
            })
            .collect())
    }
}
