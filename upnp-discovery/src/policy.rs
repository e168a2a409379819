//! Discovery filtering policies
//!
//! A [`FindOptions`] decides which devices and services a fan-out reports for
//! a newly found device tree. The two options are independent axes; the
//! search filter only matters for the `SearchUriMatches` service options.

use serde::{Deserialize, Serialize};

/// Which devices of a found tree are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFindOption {
    /// Only the device the transport found
    #[default]
    FoundDevicesOnly,
    /// The found device and every embedded device below it
    AllChildrenDevices,
}

/// Which services of a found tree are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceFindOption {
    /// No services
    #[default]
    None,
    /// Services of the reported devices only
    FoundDeviceDirectChildrenOnly,
    /// Services of every device in the tree
    AllDeviceChildrenServices,
    /// Services of every device in the tree whose type equals the search filter
    AllSearchUriMatchesServiceTypeId,
    /// Services of the reported devices whose type equals the search filter
    FoundDeviceDirectChildrenOnlySearchUriMatchesServiceTypeId,
}

impl ServiceFindOption {
    /// True when services must be looked for in every device of the tree,
    /// reported or not
    pub fn traverses_all_children(self) -> bool {
        matches!(
            self,
            ServiceFindOption::AllDeviceChildrenServices | ServiceFindOption::AllSearchUriMatchesServiceTypeId
        )
    }

    /// True when services are reported only if their type equals the filter
    pub fn matches_search_uri(self) -> bool {
        matches!(
            self,
            ServiceFindOption::AllSearchUriMatchesServiceTypeId
                | ServiceFindOption::FoundDeviceDirectChildrenOnlySearchUriMatchesServiceTypeId
        )
    }
}

/// The policy set applied by one fan-out
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FindOptions {
    pub device: DeviceFindOption,
    pub service: ServiceFindOption,
    /// Service type compared for exact equality by the `SearchUriMatches` options
    pub search_filter: Option<String>,
}

impl FindOptions {
    pub fn new(device: DeviceFindOption, service: ServiceFindOption) -> Self {
        Self {
            device,
            service,
            search_filter: None,
        }
    }

    /// Report the whole tree: every device and every service
    pub fn everything() -> Self {
        Self::new(
            DeviceFindOption::AllChildrenDevices,
            ServiceFindOption::AllDeviceChildrenServices,
        )
    }

    /// Report every service of the given type anywhere in the tree
    pub fn service_type(service_type: impl Into<String>) -> Self {
        Self::new(
            DeviceFindOption::FoundDevicesOnly,
            ServiceFindOption::AllSearchUriMatchesServiceTypeId,
        )
        .with_search_filter(service_type)
    }

    pub fn with_search_filter(mut self, filter: impl Into<String>) -> Self {
        self.search_filter = Some(filter.into());
        self
    }

    /// Whether the tree below a reported device must be walked
    pub fn descends(&self) -> bool {
        self.device == DeviceFindOption::AllChildrenDevices || self.service.traverses_all_children()
    }

    /// Whether a device is reported
    pub fn reports_device(&self, is_root: bool) -> bool {
        is_root || self.device == DeviceFindOption::AllChildrenDevices
    }

    /// Whether a device's services are enumerated
    pub fn enumerates_services(&self, is_root: bool) -> bool {
        self.service != ServiceFindOption::None
            && (self.service.traverses_all_children() || self.reports_device(is_root))
    }

    /// Whether a service of `service_type` passes the filter
    ///
    /// Without a search filter the `SearchUriMatches` options match nothing.
    pub fn accepts_service(&self, service_type: &str) -> bool {
        if !self.service.matches_search_uri() {
            return true;
        }
        self.search_filter.as_deref() == Some(service_type)
    }

    /// Check the combination is meaningful
    pub fn validate(&self) -> Result<(), String> {
        if self.service.matches_search_uri()
            && self.search_filter.as_deref().map_or(true, |f| f.trim().is_empty())
        {
            return Err(format!("service option {:?} requires a search filter", self.service));
        }
        Ok(())
    }
}
