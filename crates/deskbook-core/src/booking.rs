//! Booking domain model.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::window::TimeWindow;

/// Opaque identifier of a bookable resource (a desk, a room).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An order created by the booking step, scoping the checkout calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Order id (`oid`)
    pub id: String,
    /// Order access token (`oat`)
    pub access_token: String,
}

/// Customer identity prefilled by the platform from the authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of one reservation attempt for a (resource, window) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The order was confirmed
    Success,
    /// Someone else claimed the slot; another resource may still work
    SlotUnavailable,
    /// Confirmation was refused, usually a quota for the window
    CheckoutRejected,
}

impl BookingOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A confirmed reservation as reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub resource: ResourceId,
    pub window: TimeWindow,
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource {} for {}", self.resource, self.window)
    }
}

/// Operations the scheduler needs from the booking platform.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Resources bookable for the whole window, in server order.
    ///
    /// An empty list is a normal result, not an error.
    async fn find_available_resources(&self, window: &TimeWindow) -> Result<Vec<ResourceId>>;

    /// Creates and confirms an order for `resource` during `window`.
    async fn reserve(&self, resource: &ResourceId, window: &TimeWindow) -> Result<BookingOutcome>;
}
