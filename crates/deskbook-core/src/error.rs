//! Error types for deskbook.

use std::fmt::Display;

use thiserror::Error;

/// A shared error type for the whole login-and-booking pipeline.
///
/// Expected reservation results (a slot taken by someone else, a checkout
/// refused because of a booking quota) are not errors; they are reported as
/// [`crate::booking::BookingOutcome`] values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskbookError {
    /// Missing credentials, unknown provider, invalid timezone or slot.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure while talking to a remote endpoint
    #[error("Network error during {phase}: {message}")]
    Network { phase: &'static str, message: String },

    /// An expected fragment was absent from a response
    #[error("Extraction error during {phase}: pattern not found: {pattern}")]
    Extraction {
        phase: &'static str,
        pattern: String,
    },

    /// Credentials rejected, SSO error page, or missing session token
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Malformed or incomplete booking API response
    #[error("Booking protocol error at {step}: {message}")]
    BookingProtocol { step: &'static str, message: String },
}

impl DeskbookError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a Network error from any transport error
    pub fn network(phase: &'static str, err: impl Display) -> Self {
        Self::Network {
            phase,
            message: err.to_string(),
        }
    }

    /// Creates an Extraction error
    pub fn extraction(phase: &'static str, pattern: impl Into<String>) -> Self {
        Self::Extraction {
            phase,
            pattern: pattern.into(),
        }
    }

    /// Creates an Authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Creates a BookingProtocol error
    pub fn booking_protocol(step: &'static str, message: impl Into<String>) -> Self {
        Self::BookingProtocol {
            step,
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    pub fn is_booking_protocol(&self) -> bool {
        matches!(self, Self::BookingProtocol { .. })
    }

    /// Whether the scheduler may continue with another resource or window.
    ///
    /// Only booking protocol errors are scoped to a single attempt; every
    /// other kind aborts the run.
    pub fn is_attempt_scoped(&self) -> bool {
        self.is_booking_protocol()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<toml::de::Error> for DeskbookError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(format!("invalid TOML: {}", err))
    }
}

impl From<chrono::ParseError> for DeskbookError {
    fn from(err: chrono::ParseError) -> Self {
        Self::Configuration(format!("invalid time of day: {}", err))
    }
}

/// A type alias for `Result<T, DeskbookError>`.
pub type Result<T> = std::result::Result<T, DeskbookError>;
