//! Where login credentials come from.
//!
//! Credentials are read from the environment only and are never written to
//! disk.

use std::env;

use deskbook_core::Credentials;

pub const USERNAME_VAR: &str = "DESKBOOK_USERNAME";
pub const PASSWORD_VAR: &str = "DESKBOOK_PASSWORD";

/// Supplies credentials for a run, if any are available.
pub trait CredentialSource {
    fn credentials(&self) -> Option<Credentials>;
}

/// Reads `DESKBOOK_USERNAME` and `DESKBOOK_PASSWORD`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> Option<Credentials> {
        let username = env::var(USERNAME_VAR).ok()?;
        let password = env::var(PASSWORD_VAR).ok()?;
        Some(Credentials::new(username, password))
    }
}

/// Fixed credentials, mainly for tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(username, password))
    }
}

impl CredentialSource for StaticCredentials {
    fn credentials(&self) -> Option<Credentials> {
        Some(self.0.clone())
    }
}
