use console::Style;
use fortivpn::{LoginFrontend, NoBrowser, SystemBrowser};
use indicatif::ProgressBar;
use std::time::Duration;

/// Terminal frontend: opens the browser (unless disabled) and spins while waiting.
pub(crate) struct TerminalFrontend {
    open_browser: bool,
    quiet: bool,
    spinner: ProgressBar,
}

impl TerminalFrontend {
    pub(crate) fn new(open_browser: bool, quiet: bool) -> Self {
        Self {
            open_browser,
            quiet,
            spinner: ProgressBar::new_spinner(),
        }
    }
}

impl LoginFrontend for TerminalFrontend {
    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        if !self.open_browser {
            return NoBrowser.open_url(url);
        }
        SystemBrowser.open_url(url)?;
        if !self.quiet {
            let bold = Style::new().bold();
            eprintln!("{} Continue the login in your browser", bold.apply_to(">>"));
        }
        Ok(())
    }

    fn on_waiting(&self, _url: &str) {
        if self.quiet {
            return;
        }
        self.spinner.set_message("Waiting for the SAML callback...");
        self.spinner.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_wait_finished(&self) {
        self.spinner.finish_and_clear();
    }
}
