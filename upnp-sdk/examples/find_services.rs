//! Search for one service type and print each SCPD's actions
//!
//! ```text
//! cargo run -p upnp-sdk --example find_services -- urn:schemas-upnp-org:service:WANIPConnection:1
//! ```

use upnp_sdk::{logging, DeviceEvent, SdkConfig, UpnpSystem};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(logging::LoggingMode::Development)?;

    let service_type = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "urn:schemas-upnp-org:service:WANIPConnection:1".to_string());
    let system = UpnpSystem::new(SdkConfig::service_type(&service_type))?;

    let mut roots = Vec::new();
    for event in system.search()? {
        match event {
            DeviceEvent::DeviceAdded { device, .. } => {
                println!("{} ({})", device.friendly_name, device.udn);
                roots.push(device.udn);
            }
            DeviceEvent::ServiceAdded { service, .. } => {
                let Some(root_udn) = roots.last() else { continue };
                match system.service_description_by_id(root_udn, &service.device_udn, &service.service_id) {
                    Ok(scpd) => {
                        println!("  {} on {}", service.service_id, service.device_udn);
                        for action in scpd.actions().values() {
                            println!("    {}", action.name());
                        }
                    }
                    Err(e) => eprintln!("  {}: {}", service.service_id, e),
                }
            }
            DeviceEvent::SearchComplete => println!("search complete"),
            DeviceEvent::DeviceRemoved { .. } => {}
        }
    }

    Ok(())
}
