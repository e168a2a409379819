//! Push-style discovery front end
//!
//! Transports that call back on their own threads report raw events to a
//! [`DeviceFinder`], which fans found devices out and forwards everything to
//! a listener.

use tracing::debug;

use crate::event::DeviceEvent;
use crate::fanout::FanOut;
use crate::handle::{DeviceHandle, InterfaceOrigin};
use crate::policy::FindOptions;

/// Pairs a [`FanOut`] with a notification listener
///
/// All methods take `&self`, so one finder can serve callbacks for several
/// devices at once. The listener runs on the calling thread.
pub struct DeviceFinder<L> {
    fan_out: FanOut,
    listener: L,
}

impl<L> DeviceFinder<L>
where
    L: Fn(DeviceEvent) + Send + Sync,
{
    pub fn new(options: FindOptions, listener: L) -> Self {
        Self {
            fan_out: FanOut::new(options),
            listener,
        }
    }

    pub fn options(&self) -> &FindOptions {
        self.fan_out.options()
    }

    /// A device was found on `origin`
    pub fn device_found(&self, device: &dyn DeviceHandle, origin: &InterfaceOrigin) {
        self.fan_out.run(device, origin, &mut |event: DeviceEvent| (self.listener)(event));
    }

    /// A device left the network
    pub fn device_removed(&self, udn: &str, origin: &InterfaceOrigin) {
        debug!(udn = %udn, origin = %origin, "Device removed");
        (self.listener)(DeviceEvent::DeviceRemoved {
            udn: udn.to_string(),
            origin: origin.clone(),
        });
    }

    /// The transport finished its search
    pub fn search_complete(&self) {
        (self.listener)(DeviceEvent::SearchComplete);
    }
}
