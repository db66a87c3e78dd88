//! HTTPS exchanges with the Fortigate gateway.
//!
//! Two requests are made per login: the SAML start request, whose answer points
//! at the IdP, and the auth-id exchange, whose answer carries the session cookie.
//! Both go through the same client so the gateway's session cookies set by the
//! first request are replayed on the second.

use crate::endpoint::GatewayEndpoint;
use crate::error::LoginError;
use crate::token::{AuthIdentifier, SamlRedirect, SessionCookie};
use anyhow::Context;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Gateway-specific request shapes. Defaults match FortiOS 6.x/7.x.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayPaths {
    pub saml_start_path: String,
    pub auth_id_path: String,
    pub id_param: String,
    pub cookie_name: String,
}

impl Default for GatewayPaths {
    fn default() -> Self {
        Self {
            saml_start_path: "/remote/saml/start?redirect=1".to_string(),
            auth_id_path: "/remote/saml/auth_id".to_string(),
            id_param: "id".to_string(),
            cookie_name: "SVPNCOOKIE".to_string(),
        }
    }
}

/// Options for building a [`GatewayClient`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub paths: GatewayPaths,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Accept self-signed appliance certificates.
    pub accept_invalid_certs: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            paths: GatewayPaths::default(),
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }
}

/// The two gateway operations the login flow depends on.
pub trait Gateway {
    /// Asks the gateway where the browser should go to authenticate.
    fn connect_saml(&self, endpoint: &GatewayEndpoint) -> Result<SamlRedirect, LoginError>;

    /// Trades the identifier captured from the browser callback for a session cookie.
    fn exchange_for_cookie(
        &self,
        endpoint: &GatewayEndpoint,
        id: AuthIdentifier,
    ) -> Result<SessionCookie, LoginError>;
}

pub struct GatewayClient {
    http: Client,
    paths: GatewayPaths,
}

impl GatewayClient {
    pub fn new(options: GatewayOptions) -> Result<Self, LoginError> {
        let http = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .user_agent(options.user_agent)
            .timeout(options.request_timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            paths: options.paths,
        })
    }
}

impl Gateway for GatewayClient {
    fn connect_saml(&self, endpoint: &GatewayEndpoint) -> Result<SamlRedirect, LoginError> {
        let url = endpoint.join(&self.paths.saml_start_path);
        info!("[*] Requesting SAML redirect from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = response.status();
        debug!("[*] SAML start answered {}", status);

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    LoginError::connect(format!("gateway answered {} without a Location", status))
                })?;
            return Ok(SamlRedirect::new(resolve_location(&url, location)?));
        }

        if status.is_success() {
            let body = response
                .text()
                .context("failed to read the SAML start response")?;
            return match extract_redirect_from_body(&body) {
                Some(location) => Ok(SamlRedirect::new(resolve_location(&url, &location)?)),
                None => Err(LoginError::connect(
                    "gateway did not ask for SAML authentication (no redirect in response)",
                )),
            };
        }

        Err(LoginError::connect(format!(
            "gateway answered {} to the SAML start request",
            status
        )))
    }

    fn exchange_for_cookie(
        &self,
        endpoint: &GatewayEndpoint,
        id: AuthIdentifier,
    ) -> Result<SessionCookie, LoginError> {
        if id.is_invalid() {
            return Err(LoginError::InvalidIdentifier);
        }

        let url = endpoint.join(&self.paths.auth_id_path);
        info!("[*] Exchanging auth id at {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[(self.paths.id_param.as_str(), id.as_str())])
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = response.status();
        debug!("[*] Auth id exchange answered {}", status);

        if status.is_client_error() || status.is_server_error() {
            return Err(LoginError::connect(format!(
                "gateway answered {} to the auth id exchange",
                status
            )));
        }

        let value = find_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
            &self.paths.cookie_name,
        )
        .ok_or_else(|| {
            LoginError::connect(format!(
                "gateway did not set {} (the auth id may have expired)",
                self.paths.cookie_name
            ))
        })?;

        debug!("[✓] Received {} ({} chars)", self.paths.cookie_name, value.len());
        Ok(SessionCookie::new(&self.paths.cookie_name, &value))
    }
}

/// Returns `location` untouched when absolute, otherwise resolved against `base`.
fn resolve_location(base: &str, location: &str) -> anyhow::Result<String> {
    if Url::parse(location).is_ok() {
        return Ok(location.to_string());
    }
    let base = Url::parse(base).with_context(|| format!("invalid request URL {}", base))?;
    let joined = base
        .join(location)
        .with_context(|| format!("invalid redirect target {}", location))?;
    Ok(joined.to_string())
}

/// Finds a redirect target inside an HTML/JS body: a `<meta http-equiv="refresh">`
/// tag or a script `location` assignment. Other attributes that merely end in
/// `url` (`data-url`, `action-url`, ...) are not redirects.
fn extract_redirect_from_body(body: &str) -> Option<String> {
    // `&amp;` separates query parameters in HTML-escaped URLs; it must be
    // decoded before any `;` is treated as a delimiter.
    let body = body.replace("&amp;", "&");
    meta_refresh_target(&body).or_else(|| script_location_target(&body))
}

fn meta_refresh_target(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("<meta") {
        let start = from + pos;
        let end = lower[start..].find('>').map_or(lower.len(), |e| start + e);
        from = end;

        let tag = &body[start..end];
        let is_refresh = attribute(tag, "http-equiv")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"));
        if !is_refresh {
            continue;
        }
        // content="<delay>; url=<target>"
        let Some((_, target)) = attribute(tag, "content").and_then(|c| c.split_once(';')) else {
            continue;
        };
        let target = target.trim();
        let target = match target.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("url=") => &target[4..],
            _ => target,
        };
        let target = target.trim().trim_matches(['"', '\'']);
        if is_redirect_target(target) {
            return Some(target.to_string());
        }
    }
    None
}

fn script_location_target(body: &str) -> Option<String> {
    const NAME: &str = "location";

    let mut from = 0;
    while let Some(pos) = body[from..].find(NAME) {
        let at = from + pos;
        from = at + NAME.len();

        // Part of a longer identifier such as `geolocation`.
        if body[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            continue;
        }

        let rest = &body[from..];
        let value = if let Some(args) = rest.strip_prefix(".replace(") {
            args.trim_start()
        } else {
            let rest = rest.strip_prefix(".href").unwrap_or(rest).trim_start();
            match rest.strip_prefix('=') {
                // `==` is a comparison, not an assignment
                Some(value) if !value.starts_with('=') => value.trim_start(),
                _ => continue,
            }
        };

        if let Some(target) = quoted(value).filter(|t| is_redirect_target(t)) {
            return Some(target.to_string());
        }
    }
    None
}

/// Value of attribute `name` inside a single tag, quoted or bare.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(name) {
        let at = from + pos;
        from = at + name.len();
        if !lower[..at].ends_with(|c: char| c.is_ascii_whitespace()) {
            continue;
        }
        let Some(value) = tag[from..].trim_start().strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        return Some(quoted(value).unwrap_or_else(|| {
            let end = value
                .find(|c: char| c.is_ascii_whitespace() || c == '>')
                .unwrap_or(value.len());
            &value[..end]
        }));
    }
    None
}

/// Contents of a string literal starting at the beginning of `s`.
fn quoted(s: &str) -> Option<&str> {
    let quote = s.chars().next()?;
    if !matches!(quote, '"' | '\'' | '`') {
        return None;
    }
    let inner = &s[1..];
    inner.find(quote).map(|end| &inner[..end])
}

fn is_redirect_target(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://") || target.starts_with('/')
}

/// Picks the first non-empty `name=value` pair for `name` out of `Set-Cookie` lines.
fn find_cookie<'a>(set_cookies: impl Iterator<Item = &'a str>, name: &str) -> Option<String> {
    set_cookies
        .filter_map(|line| line.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(n, v)| n.trim() == name && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}
