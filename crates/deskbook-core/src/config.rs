//! Run configuration model.
//!
//! [`RootConfig`] mirrors the TOML file as written by the user. It is turned
//! into a validated [`RunConfig`] together with the credentials taken from the
//! environment; every configuration error surfaces there, before any network
//! call is made.

use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::booking::ResourceId;
use crate::credentials::Credentials;
use crate::error::{DeskbookError, Result};
use crate::institution::Institution;
use crate::window::{Slot, parse_timezone};

pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.anny.eu";
pub const DEFAULT_PLATFORM_BASE_URL: &str = "https://anny.eu";
pub const DEFAULT_BOOKING_API_BASE_URL: &str = "https://b.anny.eu/api/v1";
pub const DEFAULT_CHECKOUT_FORM_URL: &str = "https://b.anny.eu/api/ui/checkout-form";
pub const DEFAULT_RESOURCE_PATH: &str = "/resources/1-lehrbuchsammlung-eg-und-1-og/children";
pub const DEFAULT_SERVICE_ID: &str = "449";
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
pub const DEFAULT_MAX_RELEASE_WAIT_SECS: u64 = 10 * 60;

/// Base URLs of the remote services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Federation broker (`/login/sso` lives here)
    pub auth_base: String,
    /// Booking platform front end, owner of the session cookies
    pub platform_base: String,
    /// Booking REST API
    pub booking_api_base: String,
    /// Checkout form endpoint
    pub checkout_form: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: DEFAULT_AUTH_BASE_URL.to_string(),
            platform_base: DEFAULT_PLATFORM_BASE_URL.to_string(),
            booking_api_base: DEFAULT_BOOKING_API_BASE_URL.to_string(),
            checkout_form: DEFAULT_CHECKOUT_FORM_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at one base URL, as used with a mock server.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_base: base.to_string(),
            platform_base: base.to_string(),
            booking_api_base: format!("{}/api/v1", base),
            checkout_form: format!("{}/api/ui/checkout-form", base),
        }
    }
}

/// Which resources the scheduler may book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPreferences {
    /// Allow-list in priority order; empty means no preference
    pub preferred_resources: Vec<ResourceId>,
    /// Whether resources outside the allow-list may be booked
    pub accept_any_resource: bool,
}

/// Configuration file contents (`config.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    pub provider: Option<String>,
    pub timezone: String,
    pub release_time: NaiveTime,
    pub max_release_wait_secs: u64,
    pub service_id: String,
    pub resource_path: String,
    pub preferred_resources: Vec<String>,
    pub accept_any_resource: bool,
    pub slots: Vec<Slot>,
    pub endpoints: Endpoints,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            provider: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            release_time: NaiveTime::MIN,
            max_release_wait_secs: DEFAULT_MAX_RELEASE_WAIT_SECS,
            service_id: DEFAULT_SERVICE_ID.to_string(),
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
            preferred_resources: Vec::new(),
            accept_any_resource: true,
            slots: vec![Slot::new(
                NaiveTime::from_hms_opt(13, 0, 0).unwrap_or(NaiveTime::MIN),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            )],
            endpoints: Endpoints::default(),
        }
    }
}

impl RootConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub institution: Institution,
    pub timezone: Tz,
    pub release_time: NaiveTime,
    pub max_release_wait: Duration,
    pub service_id: String,
    pub resource_url: String,
    pub preferences: BookingPreferences,
    pub slots: Vec<Slot>,
    pub endpoints: Endpoints,
}

impl RunConfig {
    /// Validates the file configuration and attaches the credentials.
    pub fn from_root(root: RootConfig, credentials: Option<Credentials>) -> Result<Self> {
        let credentials = credentials.ok_or_else(|| {
            DeskbookError::configuration("Missing username or password for SSO login")
        })?;
        if credentials.username().is_empty() || credentials.password().is_empty() {
            return Err(DeskbookError::configuration(
                "Missing username or password for SSO login",
            ));
        }

        let provider = root
            .provider
            .as_deref()
            .ok_or_else(|| DeskbookError::configuration("No SSO provider configured"))?;
        let institution = Institution::from_name(provider)?;
        let timezone = parse_timezone(&root.timezone)?;

        if root.slots.is_empty() {
            return Err(DeskbookError::configuration("No booking slots configured"));
        }
        if let Some(slot) = root.slots.iter().find(|slot| slot.start >= slot.end) {
            return Err(DeskbookError::configuration(format!(
                "Slot {} ends before it starts",
                slot
            )));
        }
        if root.service_id.trim().is_empty() {
            return Err(DeskbookError::configuration("Service id must not be empty"));
        }

        let resource_url = if root.resource_path.starts_with("http://")
            || root.resource_path.starts_with("https://")
        {
            root.resource_path.clone()
        } else {
            format!(
                "{}/{}",
                root.endpoints.booking_api_base.trim_end_matches('/'),
                root.resource_path.trim_start_matches('/')
            )
        };

        Ok(Self {
            credentials,
            institution,
            timezone,
            release_time: root.release_time,
            max_release_wait: Duration::from_secs(root.max_release_wait_secs),
            service_id: root.service_id,
            resource_url,
            preferences: BookingPreferences {
                preferred_resources: root
                    .preferred_resources
                    .into_iter()
                    .map(ResourceId::new)
                    .collect(),
                accept_any_resource: root.accept_any_resource,
            },
            slots: root.slots,
            endpoints: root.endpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Option<Credentials> {
        Some(Credentials::new("ab1234", "secret"))
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
provider = "TUM"
timezone = "Europe/Berlin"
release_time = "00:00:00"
service_id = "449"
preferred_resources = ["101", "102"]
accept_any_resource = false

[[slots]]
start = "09:00:00"
end = "13:00:00"

[[slots]]
start = "14:00:00"
end = "18:00:00"
"#;
        let root = RootConfig::from_toml_str(toml).unwrap();
        let config = RunConfig::from_root(root, credentials()).unwrap();

        assert_eq!(config.institution, Institution::Tum);
        assert_eq!(config.slots.len(), 2);
        assert_eq!(
            config.preferences.preferred_resources,
            vec![ResourceId::new("101"), ResourceId::new("102")]
        );
        assert!(!config.preferences.accept_any_resource);
        assert_eq!(
            config.resource_url,
            "https://b.anny.eu/api/v1/resources/1-lehrbuchsammlung-eg-und-1-og/children"
        );
        assert_eq!(config.max_release_wait, Duration::from_secs(600));
    }

    #[test]
    fn test_defaults_apply() {
        let root = RootConfig::from_toml_str("provider = \"kit\"").unwrap();

        assert_eq!(root.timezone, "Europe/Berlin");
        assert_eq!(root.slots.len(), 1);
        assert!(root.accept_any_resource);
        assert_eq!(root.endpoints, Endpoints::default());
    }

    #[test]
    fn test_missing_credentials() {
        let root = RootConfig::from_toml_str("provider = \"kit\"").unwrap();
        let err = RunConfig::from_root(root, None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_password_is_missing() {
        let root = RootConfig::from_toml_str("provider = \"kit\"").unwrap();
        let err = RunConfig::from_root(root, Some(Credentials::new("ab1234", ""))).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_provider() {
        let err = RunConfig::from_root(RootConfig::default(), credentials()).unwrap_err();
        assert!(err.to_string().contains("No SSO provider"));
    }

    #[test]
    fn test_unknown_provider() {
        let root = RootConfig::from_toml_str("provider = \"lmu\"").unwrap();
        let err = RunConfig::from_root(root, credentials()).unwrap_err();
        assert!(err.to_string().contains("Available: kit, tum"));
    }

    #[test]
    fn test_inverted_slot_rejected() {
        let toml = r#"
provider = "kit"
[[slots]]
start = "18:00:00"
end = "13:00:00"
"#;
        let root = RootConfig::from_toml_str(toml).unwrap();
        assert!(RunConfig::from_root(root, credentials()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_empty_slot_list_rejected() {
        let toml = "provider = \"kit\"\nslots = []\n";
        let root = RootConfig::from_toml_str(toml).unwrap();
        assert!(RunConfig::from_root(root, credentials()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_absolute_resource_url_kept() {
        let toml = r#"
provider = "kit"
resource_path = "https://example.org/api/v1/resources/x/children"
"#;
        let root = RootConfig::from_toml_str(toml).unwrap();
        let config = RunConfig::from_root(root, credentials()).unwrap();
        assert_eq!(
            config.resource_url,
            "https://example.org/api/v1/resources/x/children"
        );
    }

    #[test]
    fn test_single_host_endpoints() {
        let endpoints = Endpoints::single_host("http://127.0.0.1:1234/");
        assert_eq!(endpoints.auth_base, "http://127.0.0.1:1234");
        assert_eq!(endpoints.booking_api_base, "http://127.0.0.1:1234/api/v1");
        assert_eq!(
            endpoints.checkout_form,
            "http://127.0.0.1:1234/api/ui/checkout-form"
        );
    }
}
