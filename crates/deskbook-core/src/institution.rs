//! Supported home institutions and their static profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeskbookError, Result};

/// Static descriptor of an institution's federation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstitutionProfile {
    /// Name shown in logs
    pub display_name: &'static str,
    /// Domain posted to the federation broker to select the identity provider
    pub federation_domain: &'static str,
    /// How many days ahead resources become bookable
    pub days_ahead: i64,
}

/// Closed set of institutions whose SSO flow is implemented.
///
/// The institution-specific login steps live in `deskbook-interaction`; this
/// type only carries the identity and profile of each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Institution {
    /// Karlsruhe Institute of Technology
    Kit,
    /// Technical University of Munich
    Tum,
}

impl Institution {
    pub const ALL: [Institution; 2] = [Institution::Kit, Institution::Tum];

    /// Lookup key used in configuration files.
    pub fn key(self) -> &'static str {
        match self {
            Institution::Kit => "kit",
            Institution::Tum => "tum",
        }
    }

    pub fn profile(self) -> InstitutionProfile {
        match self {
            Institution::Kit => InstitutionProfile {
                display_name: "KIT",
                federation_domain: "kit.edu",
                days_ahead: 3,
            },
            Institution::Tum => InstitutionProfile {
                display_name: "TUM",
                federation_domain: "tum.de",
                days_ahead: 4,
            },
        }
    }

    /// Resolves a provider name, ignoring case.
    ///
    /// Unknown names fail with a configuration error that lists every
    /// supported key.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|institution| institution.key() == wanted)
            .ok_or_else(|| {
                let available = Self::ALL
                    .iter()
                    .map(|institution| institution.key())
                    .collect::<Vec<_>>()
                    .join(", ");
                DeskbookError::configuration(format!(
                    "Unknown SSO provider: {}. Available: {}",
                    name, available
                ))
            })
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}

impl FromStr for Institution {
    type Err = DeskbookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl TryFrom<String> for Institution {
    type Error = DeskbookError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
    }
}

impl From<Institution> for String {
    fn from(value: Institution) -> Self {
        value.key().to_string()
    }
}
