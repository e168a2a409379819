//! Configuration types for the upnp-sdk crate
//!
//! [`SdkConfig`] controls how [`UpnpSystem`](crate::UpnpSystem) searches the
//! network, fetches description documents and filters what it reports.

use std::time::Duration;

use serde::Deserialize;
use upnp_discovery::{ssdp, DeviceFindOption, FindOptions, ServiceFindOption};

use crate::error::{Result, SdkError};

/// Configuration for the UpnpSystem
#[derive(Debug, Clone, PartialEq)]
pub struct SdkConfig {
    /// SSDP search target sent in the M-SEARCH `ST` header
    /// Default: "ssdp:all"
    pub search_target: String,

    /// How long to collect SSDP responses
    /// Default: 3 seconds
    pub search_timeout: Duration,

    /// Timeout for each description document request
    /// Default: 5 seconds
    pub http_timeout: Duration,

    /// Maximum response delay devices may pick (MX header, 1-5)
    /// Default: 2
    pub mx: u8,

    /// User-Agent for HTTP requests and the M-SEARCH
    /// Default: "upnp-sdk/<version> UPnP/1.1"
    pub user_agent: String,

    /// Which devices and services a search reports
    /// Default: every device and every service
    pub find_options: FindOptions,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            search_target: ssdp::SEARCH_ALL.to_string(),
            search_timeout: Duration::from_secs(3),
            http_timeout: description_cache::DEFAULT_HTTP_TIMEOUT,
            mx: 2,
            user_agent: description_cache::DEFAULT_USER_AGENT.to_string(),
            find_options: FindOptions::everything(),
        }
    }
}

/// JSON form of [`SdkConfig`]; absent fields keep their defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    search_target: Option<String>,
    search_timeout_ms: Option<u64>,
    http_timeout_ms: Option<u64>,
    mx: Option<u8>,
    user_agent: Option<String>,
    find_options: Option<FindOptions>,
}

impl SdkConfig {
    /// Create a new SdkConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Root devices only, each with its direct services
    pub fn root_devices() -> Self {
        Self {
            search_target: ssdp::SEARCH_ROOT_DEVICES.to_string(),
            find_options: FindOptions::new(
                DeviceFindOption::FoundDevicesOnly,
                ServiceFindOption::FoundDeviceDirectChildrenOnly,
            ),
            ..Default::default()
        }
    }

    /// Every service of `service_type` on devices answering a search for it
    pub fn service_type(service_type: &str) -> Self {
        Self {
            search_target: service_type.to_string(),
            find_options: FindOptions::service_type(service_type),
            ..Default::default()
        }
    }

    /// Short search window for interactive tools
    pub fn quick() -> Self {
        Self {
            search_timeout: Duration::from_secs(1),
            http_timeout: Duration::from_secs(2),
            mx: 1,
            ..Default::default()
        }
    }

    /// Default configuration overlaid with `UPNP_*` environment variables
    ///
    /// - `UPNP_SEARCH_TARGET`
    /// - `UPNP_SEARCH_TIMEOUT_MS`
    /// - `UPNP_HTTP_TIMEOUT_MS`
    /// - `UPNP_MX`
    /// - `UPNP_USER_AGENT`
    /// - `UPNP_SEARCH_FILTER`
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// Default configuration overlaid with a JSON document
    ///
    /// Durations are given in milliseconds (`search_timeout_ms`,
    /// `http_timeout_ms`).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let mut config = Self::default();
        if let Some(target) = file.search_target {
            config.search_target = target;
        }
        if let Some(ms) = file.search_timeout_ms {
            config.search_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.http_timeout_ms {
            config.http_timeout = Duration::from_millis(ms);
        }
        if let Some(mx) = file.mx {
            config.mx = mx;
        }
        if let Some(user_agent) = file.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(find_options) = file.find_options {
            config.find_options = find_options;
        }
        config.validate()?;
        Ok(config)
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(target) = lookup("UPNP_SEARCH_TARGET") {
            self.search_target = target;
        }
        if let Some(ms) = lookup("UPNP_SEARCH_TIMEOUT_MS") {
            self.search_timeout = Duration::from_millis(parse_var("UPNP_SEARCH_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("UPNP_HTTP_TIMEOUT_MS") {
            self.http_timeout = Duration::from_millis(parse_var("UPNP_HTTP_TIMEOUT_MS", &ms)?);
        }
        if let Some(mx) = lookup("UPNP_MX") {
            self.mx = parse_var("UPNP_MX", &mx)?;
        }
        if let Some(user_agent) = lookup("UPNP_USER_AGENT") {
            self.user_agent = user_agent;
        }
        if let Some(filter) = lookup("UPNP_SEARCH_FILTER") {
            self.find_options.search_filter = Some(filter);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.search_target.trim().is_empty() {
            return Err(SdkError::Configuration("Search target must not be empty".to_string()));
        }

        if self.search_timeout == Duration::ZERO {
            return Err(SdkError::Configuration(
                "Search timeout must be greater than 0".to_string(),
            ));
        }

        if self.http_timeout == Duration::ZERO {
            return Err(SdkError::Configuration(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        if !(1..=5).contains(&self.mx) {
            return Err(SdkError::Configuration(format!(
                "MX must be between 1 and 5, got {}",
                self.mx
            )));
        }

        self.find_options.validate().map_err(SdkError::Configuration)?;

        Ok(())
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_search_target(mut self, target: impl Into<String>) -> Self {
        self.search_target = target.into();
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_mx(mut self, mx: u8) -> Self {
        self.mx = mx;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_find_options(mut self, options: FindOptions) -> Self {
        self.find_options = options;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SdkError::Configuration(format!("Invalid value for {}: {:?}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SdkConfig::default();
        assert_eq!(config.search_target, "ssdp:all");
        assert_eq!(config.search_timeout, Duration::from_secs(3));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.mx, 2);
        assert!(config.user_agent.starts_with("upnp-sdk/"));
        assert_eq!(config.find_options, FindOptions::everything());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let empty_target = SdkConfig::new().with_search_target("  ");
        assert!(empty_target.validate().is_err());

        let zero_timeout = SdkConfig::new().with_search_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());

        let bad_mx = SdkConfig::new().with_mx(9);
        assert!(bad_mx.validate().is_err());

        let unfiltered = SdkConfig::new().with_find_options(FindOptions::new(
            DeviceFindOption::FoundDevicesOnly,
            ServiceFindOption::AllSearchUriMatchesServiceTypeId,
        ));
        assert!(matches!(unfiltered.validate(), Err(SdkError::Configuration(_))));
    }

    #[test]
    fn test_config_presets() {
        let roots = SdkConfig::root_devices();
        assert_eq!(roots.search_target, "upnp:rootdevice");
        assert_eq!(roots.find_options.device, DeviceFindOption::FoundDevicesOnly);
        assert!(roots.validate().is_ok());

        let wanip = SdkConfig::service_type("urn:schemas-upnp-org:service:WANIPConnection:1");
        assert_eq!(
            wanip.find_options.search_filter.as_deref(),
            Some("urn:schemas-upnp-org:service:WANIPConnection:1")
        );
        assert!(wanip.validate().is_ok());

        let quick = SdkConfig::quick();
        assert_eq!(quick.search_timeout, Duration::from_secs(1));
        assert!(quick.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let config = SdkConfig::default()
            .overlay(vars(&[
                ("UPNP_SEARCH_TARGET", "upnp:rootdevice"),
                ("UPNP_SEARCH_TIMEOUT_MS", "1500"),
                ("UPNP_MX", "4"),
                ("UPNP_USER_AGENT", "test-agent/1.0"),
            ]))
            .unwrap();

        assert_eq!(config.search_target, "upnp:rootdevice");
        assert_eq!(config.search_timeout, Duration::from_millis(1500));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.mx, 4);
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let err = SdkConfig::default()
            .overlay(vars(&[("UPNP_HTTP_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("UPNP_HTTP_TIMEOUT_MS"));
    }

    #[test]
    fn test_from_json() {
        let config = SdkConfig::from_json(
            r#"{
                "search_target": "urn:schemas-upnp-org:device:InternetGatewayDevice:1",
                "http_timeout_ms": 2500,
                "find_options": {
                    "device": "all_children_devices",
                    "service": "all_search_uri_matches_service_type_id",
                    "search_filter": "urn:schemas-upnp-org:service:WANIPConnection:1"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.http_timeout, Duration::from_millis(2500));
        assert_eq!(config.search_timeout, Duration::from_secs(3));
        assert_eq!(config.find_options.device, DeviceFindOption::AllChildrenDevices);
        assert_eq!(
            config.find_options.service,
            ServiceFindOption::AllSearchUriMatchesServiceTypeId
        );
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(SdkConfig::from_json("{ not json"), Err(SdkError::Json(_))));
        assert!(matches!(SdkConfig::from_json(r#"{"searchTimeout": 1}"#), Err(SdkError::Json(_))));
        assert!(matches!(SdkConfig::from_json(r#"{"mx": 0}"#), Err(SdkError::Configuration(_))));
    }
}
