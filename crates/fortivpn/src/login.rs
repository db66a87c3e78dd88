use crate::endpoint::GatewayEndpoint;
use crate::error::LoginError;
use crate::frontend::LoginFrontend;
use crate::gateway::{Gateway, GatewayClient, GatewayOptions};
use crate::listener::{CallbackBinder, CallbackListener, ListenerConfig};
use crate::logger::Verbosity;
use crate::token::SessionCookie;
use log::{debug, info, warn};
use std::io::{self, Write};

/// Everything needed to build the default gateway client and listener.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub endpoint: GatewayEndpoint,
    pub gateway: GatewayOptions,
    pub listener: ListenerConfig,
    pub verbosity: Verbosity,
}

/// Drives one SAML login: gateway redirect, browser, callback, cookie exchange.
pub struct LoginOrchestrator<'a> {
    endpoint: GatewayEndpoint,
    gateway: &'a dyn Gateway,
    binder: &'a dyn CallbackBinder,
    frontend: &'a dyn LoginFrontend,
    verbosity: Verbosity,
}

impl<'a> LoginOrchestrator<'a> {
    pub fn new(
        endpoint: GatewayEndpoint,
        gateway: &'a dyn Gateway,
        binder: &'a dyn CallbackBinder,
        frontend: &'a dyn LoginFrontend,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            endpoint,
            gateway,
            binder,
            frontend,
            verbosity,
        }
    }

    /// Runs the flow once. Failures are reported on stderr before being returned.
    pub fn login(&self) -> Result<SessionCookie, LoginError> {
        self.login_reporting_to(&mut io::stderr())
    }

    /// Same as [`login`](Self::login), writing user-facing messages to `out`.
    ///
    /// The failure line and the manual-navigation URL are always written;
    /// verbosity only decides whether extra hints follow.
    pub fn login_reporting_to(&self, out: &mut dyn Write) -> Result<SessionCookie, LoginError> {
        let result = self.attempt(out);
        if let Err(e) = &result {
            report_failure(out, e, self.verbosity);
        }
        result
    }

    fn attempt(&self, out: &mut dyn Write) -> Result<SessionCookie, LoginError> {
        let redirect = self.gateway.connect_saml(&self.endpoint)?;
        info!("[*] IdP login page: {}", redirect);

        // Dropping the handle on any early return below also releases the socket.
        let mut listener = self.binder.start()?;
        debug!("[*] Expecting the IdP to redirect to {}", listener.callback_url());

        if let Err(e) = self.frontend.open_url(redirect.as_str()) {
            warn!("[!] Could not open a browser: {:#}", e);
            let _ = writeln!(out, "Open this URL in your browser to continue:\n  {}", redirect);
        }

        self.frontend.on_waiting(redirect.as_str());
        let captured = listener.await_token();
        self.frontend.on_wait_finished();
        listener.stop();

        let id = captured?;
        if id.is_invalid() {
            return Err(LoginError::InvalidIdentifier);
        }

        let cookie = self.gateway.exchange_for_cookie(&self.endpoint, id)?;
        info!("[✓] Session cookie obtained");
        Ok(cookie)
    }
}

/// Runs the login flow with the real gateway client and callback listener.
///
/// Every failure, including building the HTTP client, is reported on stderr.
pub fn run_saml_login(
    config: &LoginConfig,
    frontend: &dyn LoginFrontend,
) -> Result<SessionCookie, LoginError> {
    run_saml_login_reporting_to(config, frontend, &mut io::stderr())
}

fn run_saml_login_reporting_to(
    config: &LoginConfig,
    frontend: &dyn LoginFrontend,
    out: &mut dyn Write,
) -> Result<SessionCookie, LoginError> {
    let gateway = match GatewayClient::new(config.gateway.clone()) {
        Ok(gateway) => gateway,
        Err(e) => {
            report_failure(out, &e, config.verbosity);
            return Err(e);
        }
    };
    let listener = CallbackListener::new(config.listener.clone());
    LoginOrchestrator::new(
        config.endpoint.clone(),
        &gateway,
        &listener,
        frontend,
        config.verbosity,
    )
    .login_reporting_to(out)
}

fn report_failure(out: &mut dyn Write, e: &LoginError, verbosity: Verbosity) {
    debug!("[!] Login failed: {:?}", e);
    let _ = writeln!(out, "ERROR: {}", e);
    if verbosity == Verbosity::Normal {
        let _ = writeln!(out, "Run again with debug logging for details.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ListenerHandle;
    use crate::token::{AuthIdentifier, SamlRedirect};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory gateway that records what it was asked.
    struct FakeGateway {
        redirect: Result<SamlRedirect, LoginError>,
        exchanged: Mutex<Vec<String>>,
    }

    impl Gateway for FakeGateway {
        fn connect_saml(&self, _: &GatewayEndpoint) -> Result<SamlRedirect, LoginError> {
            self.redirect.clone()
        }

        fn exchange_for_cookie(
            &self,
            _: &GatewayEndpoint,
            id: AuthIdentifier,
        ) -> Result<SessionCookie, LoginError> {
            self.exchanged.lock().unwrap().push(id.as_str().to_string());
            Ok(SessionCookie::new("SVPNCOOKIE", "cafe"))
        }
    }

    struct CountingBinder {
        inner: CallbackListener,
        calls: AtomicUsize,
    }

    impl CallbackBinder for CountingBinder {
        fn start(&self) -> Result<ListenerHandle, LoginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.start()
        }
    }

    /// "Browser" that hits the callback with a fixed query string.
    struct CallbackVisitor {
        query: &'static str,
        addr: Mutex<Option<std::net::SocketAddr>>,
    }

    impl LoginFrontend for CallbackVisitor {
        fn open_url(&self, _url: &str) -> anyhow::Result<()> {
            let addr = self.addr.lock().unwrap().expect("listener address");
            let url = format!("http://{}/{}", addr, self.query);
            std::thread::spawn(move || {
                let _ = reqwest::blocking::get(url);
            });
            Ok(())
        }
    }

    fn endpoint() -> GatewayEndpoint {
        GatewayEndpoint::parse("https://vpn.example.com").unwrap()
    }

    fn binder(timeout: Duration) -> CountingBinder {
        CountingBinder {
            inner: CallbackListener::new(ListenerConfig {
                port: 0,
                timeout,
                ..ListenerConfig::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_connect_failure_never_binds() {
        let gateway = FakeGateway {
            redirect: Err(LoginError::connect("gateway answered 500")),
            exchanged: Mutex::new(Vec::new()),
        };
        let binder = binder(Duration::from_secs(1));
        let orchestrator = LoginOrchestrator::new(
            endpoint(),
            &gateway,
            &binder,
            &crate::frontend::NoBrowser,
            Verbosity::Quiet,
        );

        let result = orchestrator.login();
        assert!(matches!(result, Err(LoginError::Connect { .. })));
        assert_eq!(binder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_timeout_without_callback() {
        let gateway = FakeGateway {
            redirect: Ok(SamlRedirect::new("https://idp.example/login")),
            exchanged: Mutex::new(Vec::new()),
        };
        let binder = binder(Duration::from_millis(50));
        let orchestrator = LoginOrchestrator::new(
            endpoint(),
            &gateway,
            &binder,
            &crate::frontend::NoBrowser,
            Verbosity::Quiet,
        );

        assert!(matches!(
            orchestrator.login(),
            Err(LoginError::Timeout { .. })
        ));
        assert!(gateway.exchanged.lock().unwrap().is_empty());
    }

    /// Binder whose listener address is shared with the visiting "browser".
    struct SharingBinder<'a> {
        inner: CallbackListener,
        visitor: &'a CallbackVisitor,
    }

    impl CallbackBinder for SharingBinder<'_> {
        fn start(&self) -> Result<ListenerHandle, LoginError> {
            let handle = self.inner.start()?;
            *self.visitor.addr.lock().unwrap() = Some(handle.local_addr());
            Ok(handle)
        }
    }

    fn run_with_callback(query: &'static str, gateway: &FakeGateway) -> Result<SessionCookie, LoginError> {
        let visitor = CallbackVisitor {
            query,
            addr: Mutex::new(None),
        };
        let binder = SharingBinder {
            inner: CallbackListener::new(ListenerConfig {
                port: 0,
                timeout: Duration::from_secs(5),
                ..ListenerConfig::default()
            }),
            visitor: &visitor,
        };
        LoginOrchestrator::new(endpoint(), gateway, &binder, &visitor, Verbosity::Quiet).login()
    }

    #[test]
    fn test_identifier_reaches_gateway() {
        let gateway = FakeGateway {
            redirect: Ok(SamlRedirect::new("https://idp.example/login")),
            exchanged: Mutex::new(Vec::new()),
        };
        let cookie = run_with_callback("?id=TOKEN1", &gateway).unwrap();
        assert_eq!(cookie.as_str(), "SVPNCOOKIE=cafe");
        assert_eq!(*gateway.exchanged.lock().unwrap(), vec!["TOKEN1".to_string()]);
    }

    #[test]
    fn test_sentinel_is_rejected_before_exchange() {
        let gateway = FakeGateway {
            redirect: Ok(SamlRedirect::new("https://idp.example/login")),
            exchanged: Mutex::new(Vec::new()),
        };
        let result = run_with_callback("?id=-1", &gateway);
        assert!(matches!(result, Err(LoginError::InvalidIdentifier)));
        assert!(gateway.exchanged.lock().unwrap().is_empty());
    }

    fn reported(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_quiet_failure_still_reports_error() {
        let gateway = FakeGateway {
            redirect: Err(LoginError::connect("gateway answered 500")),
            exchanged: Mutex::new(Vec::new()),
        };
        let binder = binder(Duration::from_secs(1));
        let mut out: Vec<u8> = Vec::new();
        let result = LoginOrchestrator::new(
            endpoint(),
            &gateway,
            &binder,
            &crate::frontend::NoBrowser,
            Verbosity::Quiet,
        )
        .login_reporting_to(&mut out);

        assert!(result.is_err());
        assert_eq!(
            reported(out),
            "ERROR: Could not talk to the Fortigate gateway: gateway answered 500\n"
        );
    }

    #[test]
    fn test_normal_verbosity_adds_hint() {
        let gateway = FakeGateway {
            redirect: Err(LoginError::connect("gateway answered 500")),
            exchanged: Mutex::new(Vec::new()),
        };
        let binder = binder(Duration::from_secs(1));
        let mut out: Vec<u8> = Vec::new();
        let _ = LoginOrchestrator::new(
            endpoint(),
            &gateway,
            &binder,
            &crate::frontend::NoBrowser,
            Verbosity::Normal,
        )
        .login_reporting_to(&mut out);

        let out = reported(out);
        assert!(out.starts_with("ERROR: "));
        assert!(out.contains("debug logging"));
    }

    #[test]
    fn test_manual_url_shown_when_browser_disabled_and_quiet() {
        let gateway = FakeGateway {
            redirect: Ok(SamlRedirect::new("https://idp.example/login")),
            exchanged: Mutex::new(Vec::new()),
        };
        let binder = binder(Duration::from_millis(50));
        let mut out: Vec<u8> = Vec::new();
        let result = LoginOrchestrator::new(
            endpoint(),
            &gateway,
            &binder,
            &crate::frontend::NoBrowser,
            Verbosity::Quiet,
        )
        .login_reporting_to(&mut out);

        assert!(matches!(result, Err(LoginError::Timeout { .. })));
        let out = reported(out);
        assert!(out.contains("\n  https://idp.example/login\n"), "{}", out);
        assert!(out.contains("ERROR: No SAML callback received"), "{}", out);
    }

    #[test]
    fn test_client_build_failure_is_reported() {
        let config = LoginConfig {
            endpoint: endpoint(),
            gateway: GatewayOptions {
                // Not a valid header value, so the HTTP client refuses to build.
                user_agent: "broken\nagent".to_string(),
                ..GatewayOptions::default()
            },
            listener: ListenerConfig {
                port: 0,
                ..ListenerConfig::default()
            },
            verbosity: Verbosity::Quiet,
        };
        let mut out: Vec<u8> = Vec::new();
        let result = run_saml_login_reporting_to(&config, &crate::frontend::NoBrowser, &mut out);

        assert!(matches!(result, Err(LoginError::Connect { .. })));
        assert!(reported(out).starts_with("ERROR: Could not talk to the Fortigate gateway"));
    }
}
