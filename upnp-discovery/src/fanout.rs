//! Discovery fan-out engine
//!
//! Turns one raw "device found" event into the device and service
//! notifications the active [`FindOptions`] ask for. The walk is synchronous
//! and stateless between calls, so fan-outs for different devices can run
//! concurrently on whatever threads the transport delivers on.

use tracing::{debug, trace, warn};

use crate::event::{DeviceEvent, EventSink};
use crate::handle::{DeviceHandle, DeviceInfo, InterfaceOrigin};
use crate::policy::FindOptions;

/// Applies a policy set to found device trees
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    options: FindOptions,
}

impl FanOut {
    pub fn new(options: FindOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Walk the tree of a found device, delivering notifications to `sink`
    ///
    /// Every notification carries `origin`, the interface the found event
    /// arrived on. Enumeration failures are logged and skip only the branch
    /// they occur in.
    pub fn run(&self, device: &dyn DeviceHandle, origin: &InterfaceOrigin, sink: &mut dyn EventSink) {
        debug!(
            udn = %device.udn(),
            origin = %origin,
            device_option = ?self.options.device,
            service_option = ?self.options.service,
            "Fanning out found device"
        );
        self.visit(device, true, origin, sink);
    }

    /// Run the fan-out and collect the notifications in emission order
    pub fn collect(&self, device: &dyn DeviceHandle, origin: &InterfaceOrigin) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        self.run(device, origin, &mut |event: DeviceEvent| events.push(event));
        events
    }

    fn visit(&self, device: &dyn DeviceHandle, is_root: bool, origin: &InterfaceOrigin, sink: &mut dyn EventSink) {
        if self.options.reports_device(is_root) {
            trace!(udn = %device.udn(), "Device added");
            sink.emit(DeviceEvent::DeviceAdded {
                device: DeviceInfo::from(device),
                origin: origin.clone(),
            });
        }

        if self.options.enumerates_services(is_root) {
            self.emit_services(device, origin, sink);
        }

        if self.options.descends() {
            self.visit_children(device, origin, sink);
        }
    }

    fn emit_services(&self, device: &dyn DeviceHandle, origin: &InterfaceOrigin, sink: &mut dyn EventSink) {
        let services = match device.services() {
            Ok(services) => services,
            Err(e) => {
                warn!(udn = %device.udn(), error = %e, "Failed to enumerate services");
                return;
            }
        };

        for service in services {
            match service {
                Ok(service) if self.options.accepts_service(&service.service_type) => {
                    trace!(udn = %device.udn(), service_id = %service.service_id, "Service added");
                    sink.emit(DeviceEvent::ServiceAdded {
                        service,
                        origin: origin.clone(),
                    });
                }
                Ok(service) => {
                    trace!(service_type = %service.service_type, "Service filtered out");
                }
                Err(e) => {
                    warn!(udn = %device.udn(), error = %e, "Failed to read service");
                }
            }
        }
    }

    fn visit_children(&self, device: &dyn DeviceHandle, origin: &InterfaceOrigin, sink: &mut dyn EventSink) {
        let children = match device.children() {
            Ok(children) => children,
            Err(e) => {
                warn!(udn = %device.udn(), error = %e, "Failed to enumerate child devices");
                return;
            }
        };

        for child in children {
            match child {
                Ok(child) => self.visit(child.as_ref(), false, origin, sink),
                Err(e) => {
                    warn!(udn = %device.udn(), error = %e, "Failed to read child device");
                }
            }
        }
    }
}
