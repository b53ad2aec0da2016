//! Institution-specific credential submission.
//!
//! The federation broker redirects to the home institution's identity
//! provider; what happens there differs per institution. Each
//! [`Institution`] variant carries its own endpoints, form fields and number
//! of round trips, all dispatched through [`Authenticator::authenticate`].

use deskbook_core::error::{DeskbookError, Result};
use deskbook_core::{Credentials, Institution};
use tracing::debug;
use url::Url;

use crate::extract::{Token, extract, has_consume_marker};
use crate::http::{HttpSession, read_body};

/// Headers only the federation broker accepts; identity providers reject
/// requests that carry them.
pub const SSO_AJAX_HEADERS: [&str; 3] = ["x-requested-with", "x-inertia", "x-inertia-version"];

pub const KIT_IDP_SSO_URL: &str =
    "https://idp.scc.kit.edu/idp/profile/SAML2/Redirect/SSO?execution=e1s1";

/// The institution login page reached through the broker redirect.
#[derive(Debug, Clone)]
pub struct RedirectDescriptor {
    /// Final URL after following redirects
    pub url: Url,
    /// Page body
    pub body: String,
}

/// HTML page carrying the SAML auto-submit form. Single use.
#[derive(Debug)]
pub struct AssertionPayload(String);

impl AssertionPayload {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn html(&self) -> &str {
        &self.0
    }
}

/// Performs the institution step of the federated login.
#[derive(Debug, Clone)]
pub struct Authenticator {
    institution: Institution,
    idp_url: Option<String>,
}

impl Authenticator {
    pub fn new(institution: Institution) -> Self {
        Self {
            institution,
            idp_url: None,
        }
    }

    /// Overrides the fixed identity provider endpoint (KIT only; TUM posts
    /// back to the pages it is redirected to).
    pub fn with_idp_url(mut self, url: impl Into<String>) -> Self {
        self.idp_url = Some(url.into());
        self
    }

    pub fn institution(&self) -> Institution {
        self.institution
    }

    /// Submits `credentials` to the identity provider and returns the page
    /// holding the SAML assertion.
    ///
    /// Fails with an authentication error when the final response does not
    /// hand an assertion back to the booking platform.
    pub async fn authenticate(
        &self,
        session: &mut HttpSession,
        redirect: &RedirectDescriptor,
        credentials: &Credentials,
    ) -> Result<AssertionPayload> {
        session.remove_headers(&SSO_AJAX_HEADERS);

        let body = match self.institution {
            Institution::Kit => self.authenticate_kit(session, redirect, credentials).await?,
            Institution::Tum => authenticate_tum(session, redirect, credentials).await?,
        };

        if !has_consume_marker(&body) {
            return Err(DeskbookError::authentication(format!(
                "{} authentication failed - invalid credentials or SSO error",
                self.institution
            )));
        }

        Ok(AssertionPayload::new(body))
    }

    async fn authenticate_kit(
        &self,
        session: &HttpSession,
        redirect: &RedirectDescriptor,
        credentials: &Credentials,
    ) -> Result<String> {
        const PHASE: &str = "kit login";

        let csrf_token = extract(PHASE, &redirect.body, Token::CsrfToken)?;
        let idp_url = self.idp_url.as_deref().unwrap_or(KIT_IDP_SSO_URL);

        debug!(url = idp_url, "submitting KIT credentials");
        let response = session
            .post_form(
                PHASE,
                idp_url,
                &[
                    ("csrf_token", csrf_token.as_str()),
                    ("j_username", credentials.username()),
                    ("j_password", credentials.password()),
                    ("_eventId_proceed", ""),
                    ("fudis_web_authn_assertion_input", ""),
                ],
            )
            .await?;

        read_body(PHASE, response).await
    }
}

async fn authenticate_tum(
    session: &mut HttpSession,
    redirect: &RedirectDescriptor,
    credentials: &Credentials,
) -> Result<String> {
    const PHASE: &str = "tum login";

    // The IdP first probes browser local storage; answer it so the session
    // moves on to the password form, which embeds a fresh token.
    let csrf_token = extract(PHASE, &redirect.body, Token::CsrfToken)?;
    debug!(url = %redirect.url, "normalizing TUM IdP session state");
    let response = session
        .post_form(
            PHASE,
            redirect.url.as_str(),
            &[
                ("csrf_token", csrf_token.as_str()),
                ("shib_idp_ls_exception.shib_idp_session_ss", ""),
                ("shib_idp_ls_success.shib_idp_session_ss", "true"),
                ("shib_idp_ls_value.shib_idp_session_ss", ""),
                ("shib_idp_ls_exception.shib_idp_persistent_ss", ""),
                ("shib_idp_ls_success.shib_idp_persistent_ss", "true"),
                ("shib_idp_ls_value.shib_idp_persistent_ss", ""),
                ("shib_idp_ls_supported", "true"),
                ("_eventId_proceed", ""),
            ],
        )
        .await?;
    let form_url = response.url().clone();
    let form_body = read_body(PHASE, response).await?;

    let previous_referer = session.replace_header("referer", form_url.as_str())?;
    let result = submit_tum_credentials(session, &form_url, &form_body, credentials).await;
    session.restore_header("referer", previous_referer);
    result
}

async fn submit_tum_credentials(
    session: &HttpSession,
    form_url: &Url,
    form_body: &str,
    credentials: &Credentials,
) -> Result<String> {
    const PHASE: &str = "tum login";

    let csrf_token = extract(PHASE, form_body, Token::CsrfToken)?;
    debug!(url = %form_url, "submitting TUM credentials");
    let response = session
        .post_form(
            PHASE,
            form_url.as_str(),
            &[
                ("csrf_token", csrf_token.as_str()),
                ("j_username", credentials.username()),
                ("j_password", credentials.password()),
                ("donotcache", "1"),
                ("_eventId_proceed", ""),
            ],
        )
        .await?;

    read_body(PHASE, response).await
}
