//! Discovery notifications

use serde::{Deserialize, Serialize};

use crate::handle::{DeviceInfo, InterfaceOrigin, ServiceHandle};

/// Events emitted during device discovery
///
/// The fan-out engine produces `DeviceAdded` and `ServiceAdded`; removal and
/// search completion come from the transport and are passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
    DeviceAdded {
        device: DeviceInfo,
        origin: InterfaceOrigin,
    },
    ServiceAdded {
        service: ServiceHandle,
        origin: InterfaceOrigin,
    },
    DeviceRemoved {
        udn: String,
        origin: InterfaceOrigin,
    },
    SearchComplete,
}

impl DeviceEvent {
    /// Interface origin of the event, `None` for `SearchComplete`
    pub fn origin(&self) -> Option<&InterfaceOrigin> {
        match self {
            DeviceEvent::DeviceAdded { origin, .. }
            | DeviceEvent::ServiceAdded { origin, .. }
            | DeviceEvent::DeviceRemoved { origin, .. } => Some(origin),
            DeviceEvent::SearchComplete => None,
        }
    }

    pub fn is_device_added(&self) -> bool {
        matches!(self, DeviceEvent::DeviceAdded { .. })
    }

    pub fn is_service_added(&self) -> bool {
        matches!(self, DeviceEvent::ServiceAdded { .. })
    }
}

/// Receiver of discovery notifications
///
/// Notifications are delivered on the thread that runs the fan-out; any
/// closure taking a [`DeviceEvent`] is a sink.
pub trait EventSink {
    fn emit(&mut self, event: DeviceEvent);
}

impl<F> EventSink for F
where
    F: FnMut(DeviceEvent),
{
    fn emit(&mut self, event: DeviceEvent) {
        self(event)
    }
}
