use std::fmt;

/// Identifier and secret for one principal at the home institution.
///
/// Held in memory for the duration of a run only. The `Debug` output never
/// includes the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("ab1234", "hunter2");
        let rendered = format!("{:?}", credentials);

        assert!(rendered.contains("ab1234"));
        assert!(!rendered.contains("hunter2"));
    }
}
