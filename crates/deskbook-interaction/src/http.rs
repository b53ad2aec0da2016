//! HTTP session shared by all requests of one phase.
//!
//! A session owns a cookie jar and a mutable header bag. The bag is applied to
//! every request, so adding or removing a header affects all later calls of
//! the same phase and nothing else.

use std::sync::Arc;

use deskbook_core::error::{DeskbookError, Result};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0";

/// Cookie jar plus header bag for one phase (auth or booking).
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
    headers: HeaderMap,
}

impl HttpSession {
    /// Creates a session with an empty cookie jar.
    pub fn new() -> Result<Self> {
        Self::with_jar(Arc::new(Jar::default()))
    }

    /// Creates a session around an existing cookie jar.
    pub fn with_jar(jar: Arc<Jar>) -> Result<Self> {
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| DeskbookError::network("client setup", e))?;

        Ok(Self {
            client,
            jar,
            headers: HeaderMap::new(),
        })
    }

    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Sets a header for every later request, replacing any previous value.
    pub fn set_header(&mut self, name: &'static str, value: &str) -> Result<()> {
        let value = parse_header_value(name, value)?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(())
    }

    /// Sets a header and returns the value it replaced, for a later
    /// [`HttpSession::restore_header`].
    pub fn replace_header(&mut self, name: &'static str, value: &str) -> Result<Option<HeaderValue>> {
        let value = parse_header_value(name, value)?;
        Ok(self.headers.insert(HeaderName::from_static(name), value))
    }

    /// Puts back a value returned by [`HttpSession::replace_header`].
    pub fn restore_header(&mut self, name: &'static str, previous: Option<HeaderValue>) {
        let name = HeaderName::from_static(name);
        match previous {
            Some(value) => {
                self.headers.insert(name, value);
            }
            None => {
                self.headers.remove(name);
            }
        }
    }

    pub fn remove_header(&mut self, name: &str) -> Option<HeaderValue> {
        self.headers.remove(name)
    }

    pub fn remove_headers(&mut self, names: &[&str]) {
        for name in names {
            self.headers.remove(*name);
        }
    }

    pub async fn get(&self, phase: &'static str, url: &str) -> Result<Response> {
        self.client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| DeskbookError::network(phase, e))
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        phase: &'static str,
        url: &str,
        query: &Q,
    ) -> Result<Response> {
        self.client
            .get(url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| DeskbookError::network(phase, e))
    }

    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        phase: &'static str,
        url: &str,
        form: &F,
    ) -> Result<Response> {
        self.client
            .post(url)
            .headers(self.headers.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| DeskbookError::network(phase, e))
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        phase: &'static str,
        url: &str,
        body: &B,
    ) -> Result<Response> {
        self.client
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| DeskbookError::network(phase, e))
    }
}

/// Reads a response body, mapping transport failures to network errors.
pub async fn read_body(phase: &'static str, response: Response) -> Result<String> {
    response
        .text()
        .await
        .map_err(|e| DeskbookError::network(phase, e))
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        DeskbookError::configuration(format!("invalid value for header {}", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_restore_previous_value() {
        let mut session = HttpSession::new().unwrap();
        session.set_header("referer", "https://auth.anny.eu/").unwrap();

        let previous = session
            .replace_header("referer", "https://login.tum.de/idp")
            .unwrap();
        assert_eq!(
            session.header("referer").unwrap(),
            "https://login.tum.de/idp"
        );

        session.restore_header("referer", previous);
        assert_eq!(session.header("referer").unwrap(), "https://auth.anny.eu/");
    }

    #[test]
    fn test_restore_removes_header_that_was_absent() {
        let mut session = HttpSession::new().unwrap();

        let previous = session.replace_header("referer", "https://example.org").unwrap();
        assert!(previous.is_none());

        session.restore_header("referer", previous);
        assert!(session.header("referer").is_none());
    }

    #[test]
    fn test_remove_headers() {
        let mut session = HttpSession::new().unwrap();
        session.set_header("x-inertia", "true").unwrap();
        session.set_header("x-requested-with", "XMLHttpRequest").unwrap();
        session.set_header("origin", "https://auth.anny.eu").unwrap();

        session.remove_headers(&["x-inertia", "x-requested-with"]);

        assert!(session.header("x-inertia").is_none());
        assert!(session.header("x-requested-with").is_none());
        assert!(session.header("origin").is_some());
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let mut session = HttpSession::new().unwrap();
        assert!(session.set_header("referer", "bad\nvalue").is_err());
    }
}
