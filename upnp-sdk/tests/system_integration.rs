//! UpnpSystem wiring: caches, fan-out and invalidation

mod helpers;

use std::net::{IpAddr, Ipv4Addr};

use helpers::*;
use rstest::rstest;
use upnp_discovery::SsdpResponse;
use upnp_sdk::{
    DeviceEvent, DeviceFindOption, FindOptions, InterfaceOrigin, SdkConfig, SdkError, ServiceFindOption,
    UpnpSystem,
};

fn origin() -> InterfaceOrigin {
    InterfaceOrigin::new(3, Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10))))
}

fn root_response() -> SsdpResponse {
    SsdpResponse {
        location: gateway_location().to_string(),
        search_target: "upnp:rootdevice".to_string(),
        usn: format!("{}::upnp:rootdevice", GATEWAY_UDN),
        server: None,
        from: None,
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = SdkConfig::new().with_mx(0);
    let err = UpnpSystem::with_fetcher(config, gateway_fetcher()).unwrap_err();
    assert!(matches!(err, SdkError::Configuration(_)));
}

#[rstest]
#[case(SdkConfig::root_devices(), 1, 1)]
#[case(SdkConfig::default(), 3, 3)]
#[case(SdkConfig::service_type("urn:schemas-upnp-org:service:WANIPConnection:1"), 1, 1)]
#[case(
    SdkConfig::default().with_find_options(FindOptions::new(DeviceFindOption::AllChildrenDevices, ServiceFindOption::None)),
    3,
    0
)]
fn test_process_responses_applies_find_options(
    #[case] config: SdkConfig,
    #[case] devices: usize,
    #[case] services: usize,
) {
    let system = system_with(config, gateway_fetcher());
    let events = system.process_responses(vec![root_response()], origin());

    assert_eq!(events.iter().filter(|e| e.is_device_added()).count(), devices);
    assert_eq!(events.iter().filter(|e| e.is_service_added()).count(), services);
    assert_eq!(events.last(), Some(&DeviceEvent::SearchComplete));
    assert_eq!(system.root_cache().len(), 1);
}

#[test]
fn test_descriptions_are_served_from_cache() {
    let fetcher = gateway_fetcher();
    let system = system_with(SdkConfig::default(), fetcher.clone());

    let root = system.root_description(GATEWAY_UDN, &gateway_location()).unwrap();
    let connection = root.find_device(CONNECTION_UDN).unwrap();
    let service = connection.service(WANIP_SERVICE_ID).unwrap();
    let scpd = system.service_description(&root, service).unwrap();
    assert!(scpd.action("AddPortMapping").is_some());

    // Nothing left to fetch; both lookups must hit the caches
    fetcher.remove(&gateway_location());
    fetcher.remove(&url::Url::parse("http://192.168.1.1:49152/upnp/wanipcn.xml").unwrap());

    let again = system.root_description(GATEWAY_UDN, &gateway_location()).unwrap();
    assert!(std::sync::Arc::ptr_eq(&root, &again));
    let scpd_again = system
        .service_description_by_id(GATEWAY_UDN, CONNECTION_UDN, WANIP_SERVICE_ID)
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(&scpd, &scpd_again));
}

#[test]
fn test_service_lookup_errors() {
    let system = system_with(SdkConfig::default(), gateway_fetcher());

    let missing_root = system
        .service_description_by_id(GATEWAY_UDN, CONNECTION_UDN, WANIP_SERVICE_ID)
        .unwrap_err();
    assert!(matches!(missing_root, SdkError::DeviceNotFound(_)));

    system.root_description(GATEWAY_UDN, &gateway_location()).unwrap();
    let missing_service = system
        .service_description_by_id(GATEWAY_UDN, CONNECTION_UDN, "urn:upnp-org:serviceId:Nope")
        .unwrap_err();
    assert!(matches!(missing_service, SdkError::Cache(_)));

    // Layer3Forwarding's SCPD is not served
    let unserved = system
        .service_description_by_id(GATEWAY_UDN, GATEWAY_UDN, "urn:upnp-org:serviceId:L3Forwarding1")
        .unwrap_err();
    assert!(matches!(unserved, SdkError::Cache(_)));
    assert!(system.service_cache().is_empty());
}

#[test]
fn test_forget_device_drops_root_and_services() {
    let system = system_with(SdkConfig::default(), gateway_fetcher());
    let root = system.root_description(GATEWAY_UDN, &gateway_location()).unwrap();
    for device in root.all_devices() {
        for service in device.services().values() {
            let _ = system.service_description(&root, service);
        }
    }
    assert_eq!(system.service_cache().len(), 2);

    assert!(system.forget_device(GATEWAY_UDN));
    assert!(system.root_cache().is_empty());
    assert!(system.service_cache().is_empty());

    assert!(!system.forget_device(GATEWAY_UDN));
}

#[test]
fn test_fan_out_cached_root() {
    let system = system_with(
        SdkConfig::service_type("urn:schemas-upnp-org:service:WANIPConnection:1"),
        gateway_fetcher(),
    );
    assert!(matches!(
        system.fan_out_cached(GATEWAY_UDN, &origin()),
        Err(SdkError::DeviceNotFound(_))
    ));

    system.root_description(GATEWAY_UDN, &gateway_location()).unwrap();
    let events = system.fan_out_cached(GATEWAY_UDN, &origin()).unwrap();

    let services: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::ServiceAdded { service, .. } => Some(service.device_udn.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(services, vec![CONNECTION_UDN]);
}

#[test]
fn test_fan_out_with_sink() {
    let system = system_with(SdkConfig::root_devices(), gateway_fetcher());
    let root = system.root_description(GATEWAY_UDN, &gateway_location()).unwrap();
    let device = upnp_discovery::DescribedDevice::root(root);

    let mut seen = Vec::new();
    system.fan_out(&device, &origin(), &mut |event: DeviceEvent| seen.push(event));

    assert_eq!(seen.len(), 2);
    assert!(seen[0].is_device_added());
    assert!(seen[1].is_service_added());
}
