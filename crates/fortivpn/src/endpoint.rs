use crate::error::LoginError;
use std::fmt;
use url::Url;

/// Base URL of a Fortigate gateway, normalized to `scheme://host[:port][/path]`
/// without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint(String);

impl GatewayEndpoint {
    /// Parses and normalizes a user-supplied gateway URL.
    ///
    /// A missing scheme defaults to `https`. Query strings and fragments are dropped.
    pub fn parse(input: &str) -> Result<Self, LoginError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(LoginError::ConfigMissing);
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let invalid = |reason: String| LoginError::InvalidEndpoint {
            input: trimmed.to_string(),
            reason,
        };

        let url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;

        let mut normalized = format!("{}://{}", url.scheme(), host);
        if let Some(port) = url.port() {
            normalized.push_str(&format!(":{}", port));
        }
        normalized.push_str(url.path().trim_end_matches('/'));

        Ok(Self(normalized))
    }

    /// Resolves an absolute-path-and-query such as `/remote/saml/start?redirect=1`.
    pub fn join(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.0, path_and_query)
        } else {
            format!("{}/{}", self.0, path_and_query)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves an endpoint from the command line override or the saved setting.
/// The override wins when both are present.
pub fn resolve_endpoint(
    override_url: Option<&str>,
    saved_url: Option<&str>,
) -> Result<GatewayEndpoint, LoginError> {
    let raw = override_url
        .filter(|s| !s.trim().is_empty())
        .or(saved_url.filter(|s| !s.trim().is_empty()))
        .ok_or(LoginError::ConfigMissing)?;
    GatewayEndpoint::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_stripped() {
        let ep = GatewayEndpoint::parse("https://vpn.example.com/").unwrap();
        assert_eq!(ep.as_str(), "https://vpn.example.com");
    }

    #[test]
    fn test_port_and_path_are_kept() {
        let ep = GatewayEndpoint::parse("https://vpn.example.com:10443/portal/?x=1").unwrap();
        assert_eq!(ep.as_str(), "https://vpn.example.com:10443/portal");
        assert_eq!(
            ep.join("/remote/saml/start?redirect=1"),
            "https://vpn.example.com:10443/portal/remote/saml/start?redirect=1"
        );
    }

    #[test]
    fn test_bare_host_defaults_to_https() {
        let ep = GatewayEndpoint::parse("vpn.example.com").unwrap();
        assert_eq!(ep.to_string(), "https://vpn.example.com");
    }

    #[test]
    fn test_empty_is_config_missing() {
        assert!(matches!(
            GatewayEndpoint::parse("   "),
            Err(LoginError::ConfigMissing)
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(matches!(
            GatewayEndpoint::parse("ftp://vpn.example.com"),
            Err(LoginError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_override_wins_over_saved() {
        let ep = resolve_endpoint(Some("https://a.example"), Some("https://b.example")).unwrap();
        assert_eq!(ep.as_str(), "https://a.example");

        let ep = resolve_endpoint(None, Some("https://b.example")).unwrap();
        assert_eq!(ep.as_str(), "https://b.example");

        assert!(matches!(
            resolve_endpoint(Some(""), None),
            Err(LoginError::ConfigMissing)
        ));
    }
}
