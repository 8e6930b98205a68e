// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! ProCon.IP device HTTP API client.
//!
//! The device exposes its full state through `GET /GetState.csv` and takes
//! relay commands through `POST /usrcfg.cgi`; see [`csv`] and [`relay`] for
//! the wire formats. Everything here is request/response: a failed fetch
//! simply doesn't produce a new snapshot.

pub mod csv;
pub mod relay;

use std::time::Duration;

use awc::Connector;
use log::debug;
use url::Url;

use crate::configuration::{DeviceSettings, ENV_MSG_TRACING, bool_from_env};
use crate::device::csv::StateSnapshot;
use crate::device::relay::RelayPattern;
use crate::errors::ServiceError;

/// Create the HTTP client with the configured timeouts.
///
/// Creating a client once per process is sufficient; it is reused for every
/// request to the device.
pub fn new_http_client(connection_timeout: Duration, request_timeout: Duration) -> awc::Client {
    awc::ClientBuilder::new()
        .timeout(request_timeout)
        .connector(Connector::new().timeout(connection_timeout))
        .finish()
}

/// Device identity shared by every entity of one unit.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    /// Stable unique key: the SYSINFO device id, or `host:port` on very old
    /// firmware that doesn't report one
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
    /// The native device web UI
    pub configuration_url: Url,
}

/// HTTP client for the two device endpoints.
#[derive(Clone)]
pub struct DeviceClient {
    http: awc::Client,
    base_url: Url,
    state_url: Url,
    usrcfg_url: Url,
    auth: Option<(String, String)>,
    msg_tracing: bool,
}

impl DeviceClient {
    pub fn new(settings: &DeviceSettings) -> Result<Self, ServiceError> {
        let base_url = settings.base_url()?;
        let state_url = join_endpoint(&base_url, "GetState.csv")?;
        let usrcfg_url = join_endpoint(&base_url, "usrcfg.cgi")?;

        Ok(Self {
            http: new_http_client(
                Duration::from_secs(settings.connection_timeout as u64),
                Duration::from_secs(settings.request_timeout as u64),
            ),
            base_url,
            state_url,
            usrcfg_url,
            auth: settings
                .basic_auth()
                .map(|(username, password)| (username.to_string(), password.to_string())),
            msg_tracing: bool_from_env(ENV_MSG_TRACING),
        })
    }

    /// Apply basic auth when credentials are configured.
    ///
    /// Devices without authentication reject unexpected `Authorization`
    /// headers on some firmware versions, so the header is omitted entirely
    /// when no username is set.
    fn with_auth(&self, request: awc::ClientRequest) -> awc::ClientRequest {
        match &self.auth {
            Some((username, password)) => request.basic_auth(username, password),
            None => request,
        }
    }

    /// Fetch and decode one `GetState.csv` snapshot.
    pub async fn fetch_state(&self) -> Result<StateSnapshot, ServiceError> {
        let mut response = self
            .with_auth(self.http.get(self.state_url.as_str()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::FetchFailed(format!(
                "HTTP {} fetching {}",
                response.status(),
                self.state_url
            )));
        }

        let body = response.body().await?;
        let text = String::from_utf8(body.to_vec()).map_err(|_| {
            ServiceError::MalformedResponse("GetState.csv body is not valid UTF-8".into())
        })?;

        if self.msg_tracing {
            debug!("[{}] -> {text}", self.state_url);
        }
        text.parse()
    }

    /// POST the complete relay pattern to `/usrcfg.cgi`.
    ///
    /// The endpoint replaces the state of all relays in one request; there
    /// is no per-relay delta write.
    pub async fn write_relays(&self, pattern: RelayPattern) -> Result<(), ServiceError> {
        let body = pattern.ena_body();
        if self.msg_tracing {
            debug!("[{}] <- {body}", self.usrcfg_url);
        }

        let response = self
            .with_auth(self.http.post(self.usrcfg_url.as_str()))
            .content_type("application/x-www-form-urlencoded")
            .send_body(body)
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::FetchFailed(format!(
                "HTTP {} writing {}",
                response.status(),
                self.usrcfg_url
            )));
        }
        Ok(())
    }

    /// Device identity derived from the latest snapshot.
    pub fn device_info(&self, snapshot: &StateSnapshot) -> DeviceInfo {
        let device_id = snapshot.device_id();
        let identifier = if device_id.is_empty() {
            format!(
                "{}:{}",
                self.base_url.host_str().unwrap_or_default(),
                self.base_url.port_or_known_default().unwrap_or_default()
            )
        } else {
            device_id.to_string()
        };

        DeviceInfo {
            identifier,
            name: "ProCon.IP Pool Controller".to_string(),
            manufacturer: "Pool Digital".to_string(),
            model: "ProCon.IP".to_string(),
            sw_version: snapshot.firmware().to_string(),
            configuration_url: self.base_url.clone(),
        }
    }
}

fn join_endpoint(base_url: &Url, path: &str) -> Result<Url, ServiceError> {
    base_url
        .join(path)
        .map_err(|e| ServiceError::InternalError(format!("invalid endpoint url: {e}")))
}
