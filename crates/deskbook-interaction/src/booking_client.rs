//! Booking platform REST client.
//!
//! Talks to the JSON:API-flavoured booking endpoints with a bearer token taken
//! from the `anny_shop_jwt` session cookie. A reservation is three sequential
//! calls: create the booking, fetch the checkout form for the new order, and
//! confirm the order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono_tz::Tz;
use deskbook_core::booking::{BookingApi, BookingOutcome, CustomerIdentity, Order, ResourceId};
use deskbook_core::config::{Endpoints, RunConfig};
use deskbook_core::error::{DeskbookError, Result};
use deskbook_core::window::TimeWindow;
use reqwest::Response;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cookies::SessionCookies;
use crate::http::{HttpSession, USER_AGENT, read_body};

/// Cookie holding the platform's JWT.
pub const JWT_COOKIE: &str = "anny_shop_jwt";

const PAGE_SIZE: u32 = 250;

/// Settings the booking client needs besides the session cookies.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub endpoints: Endpoints,
    pub service_id: String,
    /// Full URL of the resource catalog listing
    pub resource_url: String,
    pub timezone: Tz,
}

impl BookingSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            service_id: config.service_id.clone(),
            resource_url: config.resource_url.clone(),
            timezone: config.timezone,
        }
    }
}

/// Booking-phase client; owns its own session seeded from the login cookies.
pub struct BookingClient {
    session: HttpSession,
    settings: BookingSettings,
}

impl BookingClient {
    /// Builds the booking session from authenticated cookies.
    ///
    /// Fails with an authentication error when the JWT cookie is absent.
    pub fn new(cookies: &SessionCookies, settings: BookingSettings) -> Result<Self> {
        let token = cookies.get(JWT_COOKIE).ok_or_else(|| {
            DeskbookError::authentication(format!("{} cookie missing after login", JWT_COOKIE))
        })?;

        let platform_base = settings.endpoints.platform_base.trim_end_matches('/');
        let mut session = HttpSession::with_jar(cookies.to_jar())?;
        session.set_header("user-agent", USER_AGENT)?;
        session.set_header("accept", "application/vnd.api+json")?;
        session.set_header("accept-encoding", "plain")?;
        session.set_header("content-type", "application/vnd.api+json")?;
        session.set_header("authorization", &format!("Bearer {}", token))?;
        session.set_header("origin", platform_base)?;
        session.set_header("referer", &format!("{}/", platform_base))?;

        Ok(Self { session, settings })
    }

    /// Lists resources available for the whole of `window`, in server order.
    pub async fn find_available_resources(&self, window: &TimeWindow) -> Result<Vec<ResourceId>> {
        const STEP: &str = "resource discovery";

        let start = window.start_param();
        let end = window.end_param();
        let page_size = PAGE_SIZE.to_string();
        let query = [
            ("page[number]", "1"),
            ("page[size]", page_size.as_str()),
            ("filter[available_from]", start.as_str()),
            ("filter[available_to]", end.as_str()),
            ("filter[availability_exact_match]", "1"),
            ("filter[exclude_hidden]", "0"),
            ("filter[exclude_child_resources]", "0"),
            ("filter[availability_service_id]", self.settings.service_id.as_str()),
            ("filter[include_unavailable]", "0"),
            ("filter[pre_order_ids]", ""),
            ("sort", "name"),
        ];

        let response = self
            .session
            .get_with_query(STEP, &self.settings.resource_url, &query)
            .await?;
        let body = successful_json(STEP, response).await?;

        let resources = match body.get("data") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.get("id")
                        .and_then(id_string)
                        .map(ResourceId::new)
                        .ok_or_else(|| DeskbookError::booking_protocol(STEP, "resource without id"))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(DeskbookError::booking_protocol(STEP, "data is not an array"));
            }
        };

        debug!(window = %window, count = resources.len(), "available resources");
        Ok(resources)
    }

    /// Creates and confirms an order for `resource` during `window`.
    pub async fn reserve(&self, resource: &ResourceId, window: &TimeWindow) -> Result<BookingOutcome> {
        let Some(order) = self.create_booking(resource, window).await? else {
            warn!(resource = %resource, "Slot already taken");
            return Ok(BookingOutcome::SlotUnavailable);
        };

        let customer = self.fetch_checkout_customer(&order).await?;

        if self.confirm_order(&order, &customer, resource).await? {
            info!(resource = %resource, window = %window, "Reservation successful");
            Ok(BookingOutcome::Success)
        } else {
            warn!(resource = %resource, window = %window, "Checkout rejected");
            Ok(BookingOutcome::CheckoutRejected)
        }
    }

    /// Returns `None` when the platform refuses the booking.
    async fn create_booking(
        &self,
        resource: &ResourceId,
        window: &TimeWindow,
    ) -> Result<Option<Order>> {
        const STEP: &str = "create booking";

        let service_id = self.settings.service_id.as_str();
        let body = CreateBookingRequest {
            resource_id: vec![resource.as_str()],
            service_id: BTreeMap::from([(service_id, 1)]),
            start_date: window.start_param(),
            end_date: window.end_param(),
            description: "",
            customer_note: "",
            add_ons_by_service: BTreeMap::from([(service_id, vec![Vec::new()])]),
            sub_bookings_by_service: BTreeMap::new(),
            strategy: "multi-resource",
        };
        let url = format!(
            "{}/order/bookings?include=customer&stateless=1",
            self.settings.endpoints.booking_api_base.trim_end_matches('/')
        );

        let response = self.session.post_json(STEP, &url, &body).await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "booking creation refused");
            return Ok(None);
        }

        let body = parse_json(STEP, &read_body(STEP, response).await?)?;
        let data = body
            .get("data")
            .ok_or_else(|| DeskbookError::booking_protocol(STEP, "response has no data"))?;
        let id = data
            .get("id")
            .and_then(id_string)
            .ok_or_else(|| DeskbookError::booking_protocol(STEP, "order id missing"))?;
        let access_token = data
            .pointer("/attributes/access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DeskbookError::booking_protocol(STEP, "order access token missing"))?;

        Ok(Some(Order {
            id,
            access_token: access_token.to_string(),
        }))
    }

    async fn fetch_checkout_customer(&self, order: &Order) -> Result<CustomerIdentity> {
        const STEP: &str = "checkout form";

        let response = self
            .session
            .get_with_query(
                STEP,
                &self.settings.endpoints.checkout_form,
                &[
                    ("oid", order.id.as_str()),
                    ("oat", order.access_token.as_str()),
                    ("stateless", "1"),
                ],
            )
            .await?;
        let body = successful_json(STEP, response).await?;

        let customer = body
            .pointer("/default/customer")
            .filter(|customer| customer.is_object())
            .ok_or_else(|| DeskbookError::booking_protocol(STEP, "prefilled customer missing"))?;

        serde_json::from_value(customer.clone())
            .map_err(|e| DeskbookError::booking_protocol(STEP, e.to_string()))
    }

    /// Returns whether the platform accepted the order.
    async fn confirm_order(
        &self,
        order: &Order,
        customer: &CustomerIdentity,
        resource: &ResourceId,
    ) -> Result<bool> {
        const STEP: &str = "confirm order";

        let platform_base = self.settings.endpoints.platform_base.trim_end_matches('/');
        let body = ConfirmOrderRequest {
            customer,
            accept_terms: true,
            payment_method: "",
            success_url: format!(
                "{}/checkout/success?oids={}&oats={}",
                platform_base, order.id, order.access_token
            ),
            cancel_url: format!(
                "{}/checkout?step=checkout&childResource={}",
                platform_base, resource
            ),
            meta: OrderMeta {
                timezone: self.settings.timezone.name(),
            },
        };
        let url = format!(
            "{}/order?oid={}&oat={}&stateless=1",
            self.settings.endpoints.booking_api_base.trim_end_matches('/'),
            order.id,
            order.access_token
        );

        let response = self.session.post_json(STEP, &url, &body).await?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "order confirmation refused");
        }
        Ok(status.is_success())
    }
}

#[async_trait]
impl BookingApi for BookingClient {
    async fn find_available_resources(&self, window: &TimeWindow) -> Result<Vec<ResourceId>> {
        BookingClient::find_available_resources(self, window).await
    }

    async fn reserve(&self, resource: &ResourceId, window: &TimeWindow) -> Result<BookingOutcome> {
        BookingClient::reserve(self, resource, window).await
    }
}

#[derive(Serialize)]
struct CreateBookingRequest<'a> {
    resource_id: Vec<&'a str>,
    service_id: BTreeMap<&'a str, u32>,
    start_date: String,
    end_date: String,
    description: &'a str,
    customer_note: &'a str,
    add_ons_by_service: BTreeMap<&'a str, Vec<Vec<Value>>>,
    sub_bookings_by_service: BTreeMap<&'a str, Value>,
    strategy: &'a str,
}

#[derive(Serialize)]
struct ConfirmOrderRequest<'a> {
    customer: &'a CustomerIdentity,
    accept_terms: bool,
    payment_method: &'a str,
    success_url: String,
    cancel_url: String,
    meta: OrderMeta<'a>,
}

#[derive(Serialize)]
struct OrderMeta<'a> {
    timezone: &'a str,
}

async fn successful_json(step: &'static str, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(DeskbookError::booking_protocol(
            step,
            format!("unexpected status {}", status),
        ));
    }
    parse_json(step, &read_body(step, response).await?)
}

fn parse_json(step: &'static str, body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| DeskbookError::booking_protocol(step, format!("invalid JSON: {}", e)))
}

/// JSON:API ids are strings, but some endpoints return plain numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_string_accepts_numbers() {
        assert_eq!(id_string(&json!("123")), Some("123".to_string()));
        assert_eq!(id_string(&json!(123)), Some("123".to_string()));
        assert_eq!(id_string(&json!("")), None);
        assert_eq!(id_string(&json!(null)), None);
    }

    #[test]
    fn test_parse_json_rejects_html() {
        let err = parse_json("checkout form", "<html>maintenance</html>").unwrap_err();
        assert!(err.is_booking_protocol());
    }

    #[test]
    fn test_missing_jwt_cookie_is_authentication_error() {
        let settings = BookingSettings {
            endpoints: Endpoints::default(),
            service_id: "449".to_string(),
            resource_url: "https://b.anny.eu/api/v1/resources/x/children".to_string(),
            timezone: chrono_tz::Europe::Berlin,
        };

        let err = BookingClient::new(&SessionCookies::default(), settings)
            .err()
            .unwrap();
        assert!(err.is_authentication());
    }
}
