// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use crate::errors::ServiceError;
use config::Config;
use log::warn;
use serde_with::{DurationSeconds, serde_as};
use std::env;
use std::ffi::OsStr;
use std::time::Duration;
use url::Url;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

pub const DEF_PORT: u16 = 80;
pub const DEF_POLL_INTERVAL_SEC: u64 = 30;

/// Polling faster than this just hammers the device web server.
const MIN_POLL_INTERVAL_SEC: u64 = 5;

/// Environment variable to enable device message tracing.
///
/// Valid values: `true` or `1`.
///
/// **Attention:** this setting is only for debugging and logs every raw
/// `GetState.csv` body and `usrcfg.cgi` payload!
pub const ENV_MSG_TRACING: &str = "PROCON_MSG_TRACING";

#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub device: DeviceSettings,
}

#[serde_as]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct DeviceSettings {
    /// IP address or hostname of the ProCon.IP unit.
    pub host: String,
    pub port: u16,
    /// Basic-auth username; an empty string disables authentication.
    pub username: String,
    pub password: String,
    /// Polling period for `GetState.csv`.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "poll_interval_sec")]
    pub poll_interval: Duration,
    /// TCP connection timeout in seconds.
    /// This is the max time allowed to connect to the device, including DNS name resolution.
    /// Make sure that `request_timeout` >= `connection_timeout`.
    pub connection_timeout: u8,
    /// Request timeout in seconds.
    /// This is the total time before a response must be received.
    pub request_timeout: u8,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            host: "192.168.3.17".to_string(),
            port: DEF_PORT,
            username: "admin".to_string(),
            password: "admin".to_string(),
            poll_interval: Duration::from_secs(DEF_POLL_INTERVAL_SEC),
            connection_timeout: 3,
            request_timeout: 10,
        }
    }
}

impl DeviceSettings {
    /// Base http URL of the device web server.
    pub fn base_url(&self) -> Result<Url, ServiceError> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
            .map_err(|e| ServiceError::InternalError(format!("invalid device address: {e}")))
    }

    /// Basic-auth credentials, `None` when authentication is disabled.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() {
            None
        } else {
            Some((self.username.as_str(), self.password.as_str()))
        }
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overridden in the following order:
/// 1. Configuration settings in the yaml configuration file specified in `filename`
/// 2. Environment variables with prefix `PROCON_` (works only for cfg keys not containing a `_`!)
///
/// E.g. `PROCON_DEVICE_HOST=pool.local` sets the `device.host` key.
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    let config = config
        .add_source(config::Environment::with_prefix("PROCON").separator("_"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    Ok(check_cfg_values(settings))
}

fn check_cfg_values(mut settings: Settings) -> Settings {
    if settings.device.poll_interval.as_secs() < MIN_POLL_INTERVAL_SEC {
        warn!("Invalid poll interval, using default.");
        settings.device.poll_interval = Duration::from_secs(DEF_POLL_INTERVAL_SEC);
    }

    if settings.device.request_timeout < settings.device.connection_timeout {
        warn!("Request timeout below connection timeout, adjusting.");
        settings.device.request_timeout = settings.device.connection_timeout;
    }

    settings
}

/// Retrieves a boolean value from the given environment variable.
///
/// The string values `true` and `1` are considered true; anything else,
/// including an undefined variable, is false.
pub fn bool_from_env<K: AsRef<OsStr>>(key: K) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or_default()
}
