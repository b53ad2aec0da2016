//! Federated login against the booking platform's SSO broker.
//!
//! The login runs four strictly sequential stages:
//!
//! 1. **Init**: baseline browser headers for the broker.
//! 2. **Broker handshake**: fetch the broker's SSO page, echo its XSRF cookie
//!    as a header, pick up the client-side router's asset version, post the
//!    institution's federation domain and follow the returned redirect.
//! 3. **Institution auth**: handled by the [`Authenticator`].
//! 4. **Consume**: repost the SAML assertion to the platform and land on the
//!    post-login page so the platform sets its session cookies.
//!
//! Any failure aborts the whole login; there is no retry inside it.

use deskbook_core::config::Endpoints;
use deskbook_core::error::{DeskbookError, Result};
use deskbook_core::Credentials;
use percent_encoding::percent_decode_str;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::authenticator::{AssertionPayload, Authenticator, RedirectDescriptor, SSO_AJAX_HEADERS};
use crate::cookies::{SessionCookies, cookie_value};
use crate::extract::{Token, extract, inertia_version};
use crate::http::{HttpSession, USER_AGENT, read_body};

const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "x-xsrf-token";
const INERTIA_LOCATION_HEADER: &str = "x-inertia-location";
const POST_LOGIN_PATH: &str = "/en-us/login?target=/en-us/home?withoutIntent=true";

/// Auth-phase session driving the SSO handshake for one institution.
pub struct FederationSession {
    session: HttpSession,
    endpoints: Endpoints,
    authenticator: Authenticator,
}

impl FederationSession {
    pub fn new(endpoints: Endpoints, authenticator: Authenticator) -> Result<Self> {
        Ok(Self {
            session: HttpSession::new()?,
            endpoints,
            authenticator,
        })
    }

    /// Runs the complete login and returns the platform's session cookies.
    pub async fn login(mut self, credentials: &Credentials) -> Result<SessionCookies> {
        let institution = self.authenticator.institution();

        self.init_headers()?;
        let redirect = self.broker_handshake().await?;

        self.session.remove_headers(&SSO_AJAX_HEADERS);
        let assertion = self
            .authenticator
            .authenticate(&mut self.session, &redirect, credentials)
            .await?;

        self.consume_assertion(assertion).await?;

        let cookies = SessionCookies::capture(
            self.session.jar(),
            &[
                self.endpoints.platform_base.as_str(),
                self.endpoints.booking_api_base.as_str(),
            ],
        )?;
        info!(institution = %institution, "Login successful");
        Ok(cookies)
    }

    fn init_headers(&mut self) -> Result<()> {
        let auth_base = self.endpoints.auth_base.trim_end_matches('/').to_string();

        self.session.set_header("user-agent", USER_AGENT)?;
        self.session.set_header("accept", "text/html, application/xhtml+xml")?;
        self.session.set_header("accept-encoding", "plain")?;
        self.session.set_header("referer", &format!("{}/", auth_base))?;
        self.session.set_header("origin", &auth_base)?;
        Ok(())
    }

    async fn broker_handshake(&mut self) -> Result<RedirectDescriptor> {
        const PHASE: &str = "broker handshake";

        let sso_url = format!("{}/login/sso", self.endpoints.auth_base.trim_end_matches('/'));
        let response = self.session.get(PHASE, &sso_url).await?;
        let page_url = response.url().clone();
        let page = read_body(PHASE, response).await?;

        let xsrf = cookie_value(self.session.jar(), &page_url, XSRF_COOKIE)
            .ok_or_else(|| DeskbookError::extraction(PHASE, format!("{} cookie", XSRF_COOKIE)))?;
        let xsrf = percent_decode_str(&xsrf).decode_utf8_lossy().into_owned();
        self.session.set_header(XSRF_HEADER, &xsrf)?;

        let page_data = extract(PHASE, &page, Token::PageData)?;
        let version = inertia_version(&page_data);
        debug!(version = %version, "broker asset version");

        self.session.set_header("x-requested-with", "XMLHttpRequest")?;
        self.session.set_header("x-inertia", "true")?;
        self.session.set_header("x-inertia-version", &version)?;

        let domain = self.authenticator.institution().profile().federation_domain;
        let response = self
            .session
            .post_json(PHASE, &sso_url, &json!({ "domain": domain }))
            .await?;
        let location = response
            .headers()
            .get(INERTIA_LOCATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                DeskbookError::extraction(PHASE, format!("{} header", INERTIA_LOCATION_HEADER))
            })?;

        debug!(location = %location, "following broker redirect");
        let response = self.session.get(PHASE, &location).await?;
        let url = response.url().clone();
        let body = read_body(PHASE, response).await?;

        Ok(RedirectDescriptor { url, body })
    }

    async fn consume_assertion(&mut self, assertion: AssertionPayload) -> Result<()> {
        const PHASE: &str = "assertion consume";

        let html = assertion.html();
        let consume_url = extract(PHASE, html, Token::FormAction)?;
        let relay_state = extract(PHASE, html, Token::RelayState)?;
        let saml_response = extract(PHASE, html, Token::SamlResponse)?;
        Url::parse(&consume_url).map_err(|_| DeskbookError::extraction(PHASE, "form action URL"))?;

        self.session
            .post_form(
                PHASE,
                &consume_url,
                &[
                    ("RelayState", relay_state.as_str()),
                    ("SAMLResponse", saml_response.as_str()),
                ],
            )
            .await?;

        let landing = format!(
            "{}{}",
            self.endpoints.platform_base.trim_end_matches('/'),
            POST_LOGIN_PATH
        );
        self.session.get(PHASE, &landing).await?;
        Ok(())
    }
}
