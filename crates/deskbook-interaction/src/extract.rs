//! Labeled pattern extraction from SSO pages.
//!
//! The SSO handshake has no API; every value is scraped out of HTML. All
//! patterns live here so a markup change touches this file only.

use deskbook_core::error::{DeskbookError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Broker asset version used when the login page does not expose one.
pub const FALLBACK_INERTIA_VERSION: &str = "66b32acea13402d3aef4488ccd239c93";

/// Marker the identity provider's response carries once an assertion for the
/// booking platform has been issued.
pub const CONSUME_MARKER: &str = "/consume";

static CSRF_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="csrf_token" value="([^"]+)""#).expect("valid regex"));
static PAGE_DATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-page="(.*?)""#).expect("valid regex"));
static FORM_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"form action="([^"]+)""#).expect("valid regex"));
static RELAY_STATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="RelayState" value="([^"]+)""#).expect("valid regex"));
static SAML_RESPONSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="SAMLResponse" value="([^"]+)""#).expect("valid regex"));
static INERTIA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""version"\s*:\s*"([a-f0-9]{32})""#).expect("valid regex"));

/// A value embedded in an SSO page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Identity provider anti-forgery token
    CsrfToken,
    /// Broker page metadata blob (`data-page`)
    PageData,
    /// Assertion auto-submit form target
    FormAction,
    /// SAML relay state
    RelayState,
    /// Encoded SAML assertion
    SamlResponse,
}

impl Token {
    pub fn label(self) -> &'static str {
        match self {
            Token::CsrfToken => "csrf_token",
            Token::PageData => "data-page",
            Token::FormAction => "form action",
            Token::RelayState => "RelayState",
            Token::SamlResponse => "SAMLResponse",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Token::CsrfToken => &CSRF_TOKEN,
            Token::PageData => &PAGE_DATA,
            Token::FormAction => &FORM_ACTION,
            Token::RelayState => &RELAY_STATE,
            Token::SamlResponse => &SAML_RESPONSE,
        }
    }
}

/// Extracts `token` from `body` and HTML-unescapes it.
///
/// A missing or empty match is an extraction error for `phase`.
pub fn extract(phase: &'static str, body: &str, token: Token) -> Result<String> {
    token
        .pattern()
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DeskbookError::extraction(phase, token.label()))
}

/// Asset version fingerprint from the broker's page metadata, or the known
/// fallback when the metadata carries none.
pub fn inertia_version(page_data: &str) -> String {
    INERTIA_VERSION
        .captures(page_data)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_INERTIA_VERSION.to_string())
}

/// Whether an identity provider response hands an assertion back to the
/// booking platform.
pub fn has_consume_marker(body: &str) -> bool {
    html_escape::decode_html_entities(body).contains(CONSUME_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_csrf_token() {
        let body = r#"<input type="hidden" name="csrf_token" value="_abc&#x3d;123" />"#;
        assert_eq!(
            extract("kit login", body, Token::CsrfToken).unwrap(),
            "_abc=123"
        );
    }

    #[test]
    fn test_missing_pattern_is_extraction_error() {
        let err = extract("kit login", "<html>no form here</html>", Token::CsrfToken).unwrap_err();

        assert!(err.is_extraction());
        assert!(err.to_string().contains("csrf_token"));
        assert!(err.to_string().contains("kit login"));
    }

    #[test]
    fn test_empty_match_is_not_returned() {
        let err = extract("broker handshake", r#"<div data-page=""></div>"#, Token::PageData)
            .unwrap_err();
        assert!(err.is_extraction());
    }

    #[test]
    fn test_extract_saml_form() {
        let body = r#"<form action="https&#x3a;&#x2f;&#x2f;anny.eu&#x2f;saml&#x2f;consume" method="post">
<input type="hidden" name="RelayState" value="cookie&#x3a;1700000000_abcd"/>
<input type="hidden" name="SAMLResponse" value="PHNhbWxwOlJlc3BvbnNl"/>
</form>"#;

        assert_eq!(
            extract("consume", body, Token::FormAction).unwrap(),
            "https://anny.eu/saml/consume"
        );
        assert_eq!(
            extract("consume", body, Token::RelayState).unwrap(),
            "cookie:1700000000_abcd"
        );
        assert_eq!(
            extract("consume", body, Token::SamlResponse).unwrap(),
            "PHNhbWxwOlJlc3BvbnNl"
        );
    }

    #[test]
    fn test_inertia_version_from_page_data() {
        let body = r#"<div id="app" data-page="{&quot;component&quot;:&quot;Auth/Sso&quot;,&quot;version&quot;:&quot;0123456789abcdef0123456789abcdef&quot;}"></div>"#;
        let page_data = extract("broker handshake", body, Token::PageData).unwrap();

        assert_eq!(
            inertia_version(&page_data),
            "0123456789abcdef0123456789abcdef"
        );
    }

    #[test]
    fn test_inertia_version_falls_back() {
        assert_eq!(
            inertia_version(r#"{"component":"Auth/Sso"}"#),
            FALLBACK_INERTIA_VERSION
        );
    }

    #[test]
    fn test_consume_marker_is_checked_after_unescaping() {
        assert!(has_consume_marker(
            "<form action=\"https&#x3a;&#x2f;&#x2f;anny.eu&#x2f;saml&#x2f;consume\">"
        ));
        assert!(!has_consume_marker("<p>Invalid password</p>"));
    }
}
