/// Hooks the login flow uses to reach the user.
///
/// `open_url` failures are not fatal: the flow prints the URL and keeps waiting.
pub trait LoginFrontend: Send + Sync {
    fn open_url(&self, url: &str) -> anyhow::Result<()>;

    /// Called right before blocking on the callback.
    fn on_waiting(&self, _url: &str) {}

    /// Called once the callback has been received or the wait has ended.
    fn on_wait_finished(&self) {}
}

/// Opens the SAML page in the user's default browser.
pub struct SystemBrowser;

impl LoginFrontend for SystemBrowser {
    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        log::debug!("[*] Opening {} in the default browser", url);
        open::that(url)?;
        Ok(())
    }
}

/// Never launches anything; the URL is printed by the flow instead.
pub struct NoBrowser;

impl LoginFrontend for NoBrowser {
    fn open_url(&self, _url: &str) -> anyhow::Result<()> {
        anyhow::bail!("browser launch disabled")
    }
}
