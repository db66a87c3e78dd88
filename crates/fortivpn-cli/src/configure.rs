use dialoguer::Input;
use fortivpn::{GatewayEndpoint, Settings};

/// Walks the user through the saved settings and returns the edited copy.
pub(crate) fn configure_interactively(current: &Settings) -> anyhow::Result<Settings> {
    let mut settings = current.clone();

    let url: String = Input::new()
        .with_prompt("Fortigate VPN URL")
        .with_initial_text(current.forti_url.clone().unwrap_or_default())
        .validate_with(|input: &String| -> Result<(), String> {
            GatewayEndpoint::parse(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;
    settings.forti_url = Some(GatewayEndpoint::parse(&url)?.to_string());

    settings.listen_port = Input::new()
        .with_prompt("Local callback port")
        .default(current.listen_port)
        .interact_text()?;

    settings.callback_timeout_secs = Input::new()
        .with_prompt("Seconds to wait for the browser")
        .default(current.callback_timeout_secs)
        .interact_text()?;

    Ok(settings)
}
