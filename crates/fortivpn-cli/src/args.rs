use clap::Parser;
use fortivpn::Verbosity;

/// Log in to a Fortigate SSL-VPN through SAML and print the session cookie.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Set the log level to DEBUG
    #[arg(short, long)]
    pub debug: bool,

    /// Do not log at all
    #[arg(short, long)]
    pub quiet: bool,

    /// Interactive configuration
    #[arg(long)]
    pub configure: bool,

    /// URL of the Fortigate VPN server
    #[arg(short = 's', long = "forti-url", value_name = "URL")]
    pub forti_url: Option<String>,

    /// Local port the gateway redirects the browser back to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Seconds to wait for the browser callback
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the login URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Accept self-signed gateway certificates
    #[arg(long)]
    pub insecure: bool,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.debug, self.quiet)
    }
}
