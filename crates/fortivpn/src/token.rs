//! Values passed between the gateway, the callback listener and the caller.

use std::fmt;

/// Value the IdP callback carries when the gateway rejected the assertion.
pub const INVALID_IDENTIFIER: &str = "-1";

/// URL of the IdP login page, as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlRedirect(String);

impl SamlRedirect {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SamlRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier captured from the browser callback.
///
/// Not `Clone`: it is handed from the listener to the gateway exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct AuthIdentifier(String);

impl AuthIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn invalid() -> Self {
        Self(INVALID_IDENTIFIER.to_string())
    }

    pub fn is_invalid(&self) -> bool {
        self.0 == INVALID_IDENTIFIER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authenticated VPN session cookie in `NAME=value` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self(format!("{}={}", name, value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
