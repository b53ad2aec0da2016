//! HTTP side of deskbook: federated SSO login and the booking REST client.

pub mod authenticator;
pub mod booking_client;
pub mod cookies;
pub mod extract;
pub mod federation;
pub mod http;

pub use authenticator::{AssertionPayload, Authenticator, RedirectDescriptor};
pub use booking_client::{BookingClient, BookingSettings};
pub use cookies::SessionCookies;
pub use federation::FederationSession;
pub use http::HttpSession;
