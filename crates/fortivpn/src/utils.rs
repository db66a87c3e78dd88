use std::env;
use std::path::PathBuf;

/// Platform-relative path from the home directory to the fortivpn config directory.
#[cfg(target_os = "linux")]
const CONFIG_SUBPATH: &str = ".config/fortivpn";

#[cfg(target_os = "macos")]
const CONFIG_SUBPATH: &str = "Library/Application Support/fortivpn";

#[cfg(target_os = "windows")]
const CONFIG_SUBPATH: &str = "AppData/Roaming/fortivpn";

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CONFIG_SUBPATH: &str = ".config/fortivpn";

/// Returns a platform-appropriate directory for the settings file.
///
/// - **Linux:** `~/.config/fortivpn`
/// - **macOS:** `~/Library/Application Support/fortivpn`
/// - **Windows:** `%USERPROFILE%\AppData\Roaming\fortivpn`
///
/// `FORTIVPN_CONFIG_DIR` overrides the location. The directory is not created here.
pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = env::var("FORTIVPN_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home_dir = env::var("HOME").or_else(|_| env::var("USERPROFILE"))?;
    Ok(PathBuf::from(&home_dir).join(CONFIG_SUBPATH))
}
