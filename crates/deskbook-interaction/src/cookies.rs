//! Authenticated cookie set handed from the login phase to the booking phase.

use std::sync::Arc;

use deskbook_core::error::{DeskbookError, Result};
use reqwest::cookie::{CookieStore, Jar};
use url::Url;

/// Cookies captured per origin at the end of a successful login.
///
/// The booking phase gets its own jar built from these values, so nothing
/// but cookies crosses from one phase to the other.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    entries: Vec<(Url, Vec<(String, String)>)>,
}

impl SessionCookies {
    /// Snapshots the cookies `jar` would send to each of `origins`.
    pub fn capture(jar: &Jar, origins: &[&str]) -> Result<Self> {
        let mut cookies = Self::default();
        for origin in origins {
            let url = parse_url(origin)?;
            let pairs = cookie_value_pairs(jar, &url);
            if !pairs.is_empty() {
                cookies.entries.push((url, pairs));
            }
        }
        Ok(cookies)
    }

    /// Adds one cookie for `origin`.
    pub fn insert(&mut self, origin: &str, name: &str, value: &str) -> Result<()> {
        let url = parse_url(origin)?;
        let pair = (name.to_string(), value.to_string());
        match self.entries.iter_mut().find(|(existing, _)| *existing == url) {
            Some((_, pairs)) => pairs.push(pair),
            None => self.entries.push((url, vec![pair])),
        }
        Ok(())
    }

    /// First value of the cookie called `name`, across all origins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .flat_map(|(_, pairs)| pairs.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a fresh jar seeded with these cookies.
    pub fn to_jar(&self) -> Arc<Jar> {
        let jar = Jar::default();
        for (url, pairs) in &self.entries {
            for (name, value) in pairs {
                jar.add_cookie_str(&format!("{}={}", name, value), url);
            }
        }
        Arc::new(jar)
    }
}

/// Value of the cookie `name` that `jar` would send to `url`.
pub fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    cookie_value_pairs(jar, url)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

fn cookie_value_pairs(jar: &Jar, url: &Url) -> Vec<(String, String)> {
    let Some(header) = jar.cookies(url) else {
        return Vec::new();
    };
    let Ok(header) = header.to_str() else {
        return Vec::new();
    };

    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn parse_url(origin: &str) -> Result<Url> {
    Url::parse(origin)
        .map_err(|e| DeskbookError::configuration(format!("invalid URL {}: {}", origin, e)))
}
