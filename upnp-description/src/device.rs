//! Device description parsing.
//!
//! This module handles the `<device>` element of a UPnP root description:
//! the device's own properties, its embedded devices, the services it
//! exposes and its icons.

use std::io::BufRead;

use crate::collection::{DescriptionDictionary, DescriptionList, KeyedDescription};
use crate::error::Result;
use crate::node::{Description, DescriptionNode, NoChildren};
use crate::reader::DescriptionReader;

/// Structured children of a `<device>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChild {
    ServiceList,
    DeviceList,
    IconList,
}

/// One `<device>` element and everything nested below it
///
/// The UDN is the device's identity; embedded devices and services record
/// the UDN of the device that owns them instead of holding a reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescription {
    node: DescriptionNode,
    parent_udn: Option<String>,
    services: DescriptionDictionary<DeviceServiceDescription>,
    devices: DescriptionDictionary<DeviceDescription>,
    icons: DescriptionList<IconDescription>,
}

impl DeviceDescription {
    /// UPnP device type URN, e.g. `urn:schemas-upnp-org:device:MediaRenderer:1`
    pub fn device_type(&self) -> &str {
        self.node.get_string("deviceType", "")
    }

    pub fn friendly_name(&self) -> &str {
        self.node.get_string("friendlyName", "")
    }

    pub fn manufacturer(&self) -> &str {
        self.node.get_string("manufacturer", "")
    }

    pub fn manufacturer_url(&self) -> Option<&str> {
        self.node.property("manufacturerURL")
    }

    pub fn model_description(&self) -> Option<&str> {
        self.node.property("modelDescription")
    }

    pub fn model_name(&self) -> &str {
        self.node.get_string("modelName", "")
    }

    pub fn model_number(&self) -> Option<&str> {
        self.node.property("modelNumber")
    }

    pub fn model_url(&self) -> Option<&str> {
        self.node.property("modelURL")
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.node.property("serialNumber")
    }

    /// Unique Device Name, e.g. `uuid:2fac1234-31f8-11b4-a222-08002b34c003`
    pub fn udn(&self) -> &str {
        self.node.get_string("UDN", "").trim()
    }

    pub fn upc(&self) -> Option<&str> {
        self.node.property("UPC")
    }

    pub fn presentation_url(&self) -> Option<&str> {
        self.node.property("presentationURL")
    }

    /// UDN of the device this one is embedded in, `None` for a root device
    pub fn parent_udn(&self) -> Option<&str> {
        self.parent_udn.as_deref()
    }

    pub fn is_root_device(&self) -> bool {
        self.parent_udn.is_none()
    }

    /// Services declared directly on this device, keyed by service id
    pub fn services(&self) -> &DescriptionDictionary<DeviceServiceDescription> {
        &self.services
    }

    /// Devices embedded directly in this device, keyed by UDN
    pub fn devices(&self) -> &DescriptionDictionary<DeviceDescription> {
        &self.devices
    }

    pub fn icons(&self) -> &DescriptionList<IconDescription> {
        &self.icons
    }

    pub fn service(&self, service_id: &str) -> Option<&DeviceServiceDescription> {
        self.services.get(service_id)
    }

    /// This device or the embedded device with the given UDN, at any depth
    pub fn find_device(&self, udn: &str) -> Option<&DeviceDescription> {
        if self.udn() == udn {
            return Some(self);
        }
        self.devices.values().find_map(|device| device.find_device(udn))
    }

    /// This device followed by all embedded devices, depth first
    pub fn all_devices(&self) -> Vec<&DeviceDescription> {
        let mut out = vec![self];
        for device in self.devices.values() {
            out.extend(device.all_devices());
        }
        out
    }

    /// Every service of this device and of its embedded devices
    pub fn all_services(&self) -> Vec<&DeviceServiceDescription> {
        self.all_devices()
            .into_iter()
            .flat_map(|device| device.services.values())
            .collect()
    }

    /// First service, at any depth, whose type equals `service_type` exactly
    pub fn find_service_by_type(&self, service_type: &str) -> Option<&DeviceServiceDescription> {
        self.all_services()
            .into_iter()
            .find(|service| service.service_type() == service_type)
    }

    pub(crate) fn set_parent_udn(&mut self, parent: Option<String>) {
        self.parent_udn = parent;
    }
}

impl Description for DeviceDescription {
    const ELEMENT: &'static str = "device";
    const PROPERTIES: &'static [&'static str] = &[
        "deviceType",
        "friendlyName",
        "manufacturer",
        "manufacturerURL",
        "modelDescription",
        "modelName",
        "modelNumber",
        "modelURL",
        "serialNumber",
        "UDN",
        "UPC",
        "presentationURL",
    ];
    type Child = DeviceChild;

    fn empty() -> Self {
        Self {
            node: DescriptionNode::new(),
            parent_udn: None,
            services: DescriptionDictionary::new("serviceList"),
            devices: DescriptionDictionary::new("deviceList"),
            icons: DescriptionList::new("iconList"),
        }
    }

    fn node(&self) -> &DescriptionNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut DescriptionNode {
        &mut self.node
    }

    fn recognize(name: &str) -> Option<DeviceChild> {
        match name {
            "serviceList" => Some(DeviceChild::ServiceList),
            "deviceList" => Some(DeviceChild::DeviceList),
            "iconList" => Some(DeviceChild::IconList),
            _ => None,
        }
    }

    fn read_child<R: BufRead>(&mut self, child: DeviceChild, reader: &mut DescriptionReader<R>) -> Result<()> {
        match child {
            DeviceChild::ServiceList => self.services.add_items_from(reader),
            DeviceChild::DeviceList => self.devices.add_items_from(reader),
            DeviceChild::IconList => self.icons.add_items_from(reader),
        }
    }

    /// The UDN may follow the lists in the document, so ownership links are
    /// filled in once the whole element has been read.
    fn finish(&mut self) -> Result<()> {
        let udn = self.udn().to_string();
        for service in self.services.values_mut() {
            service.device_udn = udn.clone();
        }
        for device in self.devices.values_mut() {
            device.set_parent_udn(Some(udn.clone()));
        }
        Ok(())
    }
}

impl KeyedDescription for DeviceDescription {
    fn key(&self) -> &str {
        self.udn()
    }
}

/// A `<service>` entry of a device's `serviceList`
///
/// This is only the pointer to a service; the service's actions and state
/// variables live in the SCPD document at [`scpd_url`](Self::scpd_url).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceServiceDescription {
    node: DescriptionNode,
    device_udn: String,
}

impl DeviceServiceDescription {
    pub fn service_type(&self) -> &str {
        self.node.get_string("serviceType", "").trim()
    }

    pub fn service_id(&self) -> &str {
        self.node.get_string("serviceId", "").trim()
    }

    pub fn scpd_url(&self) -> &str {
        self.node.get_string("SCPDURL", "")
    }

    pub fn control_url(&self) -> &str {
        self.node.get_string("controlURL", "")
    }

    pub fn event_sub_url(&self) -> &str {
        self.node.get_string("eventSubURL", "")
    }

    /// UDN of the device that declares this service
    pub fn device_udn(&self) -> &str {
        &self.device_udn
    }

    /// Identity used by the service description cache: `UDN|serviceId`
    pub fn cache_key(&self) -> String {
        service_cache_key(&self.device_udn, self.service_id())
    }
}

/// Build the `UDN|serviceId` identity of a service description
pub fn service_cache_key(udn: &str, service_id: &str) -> String {
    format!("{}|{}", udn, service_id)
}

impl Description for DeviceServiceDescription {
    const ELEMENT: &'static str = "service";
    const PROPERTIES: &'static [&'static str] =
        &["serviceType", "serviceId", "SCPDURL", "controlURL", "eventSubURL"];
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

impl KeyedDescription for DeviceServiceDescription {
    fn key(&self) -> &str {
        self.service_id()
    }
}

/// An `<icon>` entry of a device's `iconList`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IconDescription {
    node: DescriptionNode,
}

impl IconDescription {
    pub fn mime_type(&self) -> &str {
        self.node.get_string("mimetype", "")
    }

    pub fn width(&self) -> i64 {
        self.node.get_int("width", 0)
    }

    pub fn height(&self) -> i64 {
        self.node.get_int("height", 0)
    }

    pub fn depth(&self) -> i64 {
        self.node.get_int("depth", 0)
    }

    pub fn url(&self) -> &str {
        self.node.get_string("url", "")
    }
}

impl Description for IconDescription {
    const ELEMENT: &'static str = "icon";
    const PROPERTIES: &'static [&'static str] = &["mimetype", "width", "height", "depth", "url"];
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

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_device(xml: &str) -> DeviceDescription {
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content().unwrap();
        DeviceDescription::read_from(&mut reader).unwrap()
    }

    #[test]
    fn test_device_from_xml() {
        let device = parse_device(
            r#"<device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room</friendlyName>
    <manufacturer>Acme</manufacturer>
    <modelName>Streamer</modelName>
    <UDN>uuid:renderer-1</UDN>
    <roomName>Living Room</roomName>
  </device>"#,
        );

        assert_eq!(device.device_type(), "urn:schemas-upnp-org:device:MediaRenderer:1");
        assert_eq!(device.friendly_name(), "Living Room");
        assert_eq!(device.manufacturer(), "Acme");
        assert_eq!(device.model_name(), "Streamer");
        assert_eq!(device.udn(), "uuid:renderer-1");
        assert_eq!(device.model_number(), None);
        assert!(device.is_root_device());
        assert_eq!(device.unused_properties(), vec![("roomName", "Living Room")]);
    }

    #[test]
    fn test_ownership_links_are_filled_after_udn() {
        // UDN deliberately placed after both lists
        let device = parse_device(
            r#"<device>
  <serviceList>
    <service><serviceType>urn:x:service:A:1</serviceType><serviceId>urn:x:serviceId:A</serviceId></service>
  </serviceList>
  <deviceList>
    <device><UDN>uuid:child</UDN></device>
  </deviceList>
  <UDN>uuid:parent</UDN>
</device>"#,
        );

        let service = device.service("urn:x:serviceId:A").unwrap();
        assert_eq!(service.device_udn(), "uuid:parent");
        assert_eq!(service.cache_key(), "uuid:parent|urn:x:serviceId:A");

        let child = device.devices().get("uuid:child").unwrap();
        assert_eq!(child.parent_udn(), Some("uuid:parent"));
        assert!(!child.is_root_device());
    }

    #[test]
    fn test_nested_lookup_helpers() {
        let device = parse_device(
            r#"<device><UDN>uuid:a</UDN>
  <serviceList><service><serviceType>urn:x:service:Top:1</serviceType><serviceId>top</serviceId></service></serviceList>
  <deviceList>
    <device><UDN>uuid:b</UDN>
      <deviceList>
        <device><UDN>uuid:c</UDN>
          <serviceList><service><serviceType>urn:x:service:Deep:1</serviceType><serviceId>deep</serviceId></service></serviceList>
        </device>
      </deviceList>
    </device>
  </deviceList>
</device>"#,
        );

        let udns: Vec<&str> = device.all_devices().iter().map(|d| d.udn()).collect();
        assert_eq!(udns, vec!["uuid:a", "uuid:b", "uuid:c"]);
        assert_eq!(device.find_device("uuid:c").map(|d| d.parent_udn()), Some(Some("uuid:b")));
        assert!(device.find_device("uuid:zzz").is_none());

        let deep = device.find_service_by_type("urn:x:service:Deep:1").unwrap();
        assert_eq!(deep.device_udn(), "uuid:c");
        assert_eq!(device.all_services().len(), 2);
    }

    #[test]
    fn test_icons_parse_numeric_fields() {
        let device = parse_device(
            r#"<device><UDN>uuid:a</UDN><iconList>
  <icon><mimetype>image/png</mimetype><width>48</width><height>48</height><depth>24</depth><url>/icon.png</url></icon>
  <icon><mimetype>image/jpeg</mimetype><width>big</width><url>/icon.jpg</url></icon>
</iconList></device>"#,
        );

        assert_eq!(device.icons().len(), 2);
        let first = device.icons().get(0).unwrap();
        assert_eq!((first.width(), first.height(), first.depth()), (48, 48, 24));
        let second = device.icons().get(1).unwrap();
        assert_eq!(second.width(), 0);
        assert_eq!(second.url(), "/icon.jpg");
    }

    #[test]
    fn test_self_closing_lists() {
        let device = parse_device("<device><UDN>uuid:a</UDN><serviceList/><deviceList/></device>");
        assert!(device.services().is_empty());
        assert!(device.devices().is_empty());
        assert!(device.unused_properties().is_empty());
    }
}
