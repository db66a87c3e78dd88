use crate::endpoint::GatewayEndpoint;
use crate::error::LoginError;
use crate::gateway::{GatewayOptions, GatewayPaths};
use crate::listener::ListenerConfig;
use crate::logger::Verbosity;
use crate::login::LoginConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "config.json";

/// Saved configuration, edited with `--configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub forti_url: Option<String>,
    pub listen_port: u16,
    pub callback_timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub gateway: GatewayPaths,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            forti_url: None,
            listen_port: 8020,
            callback_timeout_secs: 300,
            accept_invalid_certs: false,
            gateway: GatewayPaths::default(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Result<PathBuf, LoginError> {
        let dir = crate::utils::get_config_dir().map_err(|e| LoginError::Config {
            message: format!("cannot locate the config directory: {}", e),
        })?;
        Ok(dir.join(SETTINGS_FILE))
    }

    /// Loads settings from the default location.
    pub fn load() -> Result<Self, LoginError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Missing file means defaults; a malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self, LoginError> {
        if !path.exists() {
            log::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| LoginError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| LoginError::Config {
            message: format!("bad settings in {}: {}", path.display(), e),
        })
    }

    pub fn save(&self) -> Result<PathBuf, LoginError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LoginError> {
        let write = || -> anyhow::Result<()> {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let json = serde_json::to_string_pretty(self)?;
            fs::write(path, json)?;
            Ok(())
        };
        write().map_err(|e| LoginError::Config {
            message: format!("cannot write {}: {}", path.display(), e),
        })?;
        log::info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Builds the login configuration for a resolved endpoint.
    pub fn login_config(&self, endpoint: GatewayEndpoint, verbosity: Verbosity) -> LoginConfig {
        LoginConfig {
            endpoint,
            gateway: GatewayOptions {
                paths: self.gateway.clone(),
                accept_invalid_certs: self.accept_invalid_certs,
                ..GatewayOptions::default()
            },
            listener: ListenerConfig {
                port: self.listen_port,
                timeout: Duration::from_secs(self.callback_timeout_secs),
                id_param: self.gateway.id_param.clone(),
                ..ListenerConfig::default()
            },
            verbosity,
        }
    }
}
