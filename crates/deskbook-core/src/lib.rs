pub mod booking;
pub mod config;
pub mod credentials;
pub mod error;
pub mod institution;
pub mod window;

// Re-export common error type
pub use error::{DeskbookError, Result};

pub use booking::{BookingApi, BookingOutcome, CustomerIdentity, Order, Reservation, ResourceId};
pub use config::{BookingPreferences, Endpoints, RootConfig, RunConfig};
pub use credentials::Credentials;
pub use institution::{Institution, InstitutionProfile};
pub use window::{Slot, TimeWindow};
