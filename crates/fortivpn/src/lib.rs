//! # Fortigate SAML Login Library
//!
//! This library logs in to a Fortigate SSL-VPN gateway that delegates
//! authentication to a SAML IdP, and returns the `SVPNCOOKIE` session cookie
//! a VPN client needs to bring the tunnel up.

pub mod endpoint;
pub mod error;
pub mod frontend;
pub mod gateway;
pub mod listener;
pub mod logger;
pub mod login;
pub mod settings;
pub mod token;
pub mod utils;

// Re-export commonly used items
pub use endpoint::{resolve_endpoint, GatewayEndpoint};
pub use error::{LoginError, LoginStatus};
pub use frontend::{LoginFrontend, NoBrowser, SystemBrowser};
pub use gateway::{Gateway, GatewayClient, GatewayOptions, GatewayPaths};
pub use listener::{CallbackBinder, CallbackListener, ListenerConfig, ListenerHandle};
pub use logger::{init_logger, Verbosity};
pub use login::{run_saml_login, LoginConfig, LoginOrchestrator};
pub use settings::Settings;
pub use token::{AuthIdentifier, SamlRedirect, SessionCookie};
