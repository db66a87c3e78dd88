//! # Fortigate SAML Login
//!
//! This application logs in to a Fortigate SSL-VPN through the gateway's SAML
//! IdP using the system browser, then prints the session cookie on stdout so it
//! can be handed to a VPN client (e.g. `openfortivpn --cookie`).

mod args;
mod configure;
mod terminal;

use args::Args;
use clap::Parser;
use fortivpn::{init_logger, resolve_endpoint, run_saml_login, LoginStatus, Settings};
use log::info;
use std::process::ExitCode;
use terminal::TerminalFrontend;

fn exit(status: LoginStatus) -> ExitCode {
    ExitCode::from(status.code())
}

/// The main entry point of the application.
fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = args.verbosity();
    init_logger(verbosity);

    let mut settings = match Settings::load() {
        Ok(s) => s,
        Err(e) if args.configure => {
            log::warn!("[!] {}; starting from defaults", e);
            Settings::default()
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return exit(e.exit_status());
        }
    };

    if args.configure {
        return match configure::configure_interactively(&settings) {
            Ok(edited) => match edited.save() {
                Ok(path) => {
                    info!("Configuration written to {:?}", path);
                    exit(LoginStatus::Success)
                }
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    exit(e.exit_status())
                }
            },
            Err(e) => {
                eprintln!("ERROR: configuration aborted: {}", e);
                exit(LoginStatus::GeneralError)
            }
        };
    }

    let endpoint = match resolve_endpoint(args.forti_url.as_deref(), settings.forti_url.as_deref()) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return exit(e.exit_status());
        }
    };

    if let Some(port) = args.port {
        settings.listen_port = port;
    }
    if let Some(timeout) = args.timeout {
        settings.callback_timeout_secs = timeout;
    }
    if args.insecure {
        settings.accept_invalid_certs = true;
    }

    let config = settings.login_config(endpoint, verbosity);
    let frontend = TerminalFrontend::new(!args.no_browser, verbosity.is_quiet());

    // Every failure, client construction included, is reported by run_saml_login.
    match run_saml_login(&config, &frontend) {
        Ok(cookie) => {
            println!("{}", cookie);
            exit(LoginStatus::Success)
        }
        Err(e) => exit(e.exit_status()),
    }
}
