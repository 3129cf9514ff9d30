//! REST info endpoint of the TV
//!
//! `GET /api/v2/` answers with a description of the TV, including whether
//! it supports art mode and, on newer firmware, its power state.

use crate::device::traits::{DeviceError, DeviceInfo};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    device: InfoDevice,
}

#[derive(Debug, Default, Deserialize)]
struct InfoDevice {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "modelName")]
    model_name: String,
    #[serde(default, rename = "FrameTVSupport")]
    frame_tv_support: String,
    #[serde(default, rename = "PowerState")]
    power_state: Option<String>,
}

/// Client for the TV's REST info endpoint
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    url: String,
}

impl RestClient {
    /// Create a client for `host:port`, using https on the TLS port
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|e| DeviceError::Http(e.to_string()))?;

        Ok(Self {
            http,
            url: info_url(host, port),
        })
    }

    /// Fetch the device description
    pub async fn device_info(&self) -> Result<DeviceInfo, DeviceError> {
        debug!("GET {}", self.url);
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DeviceError::Http(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| DeviceError::Http(e.to_string()))?;

        parse_device_info(&body)
    }
}

/// URL of the info endpoint
pub fn info_url(host: &str, port: u16) -> String {
    let scheme = if port == 8002 { "https" } else { "http" };
    format!("{}://{}:{}/api/v2/", scheme, host, port)
}

/// Decode the info endpoint's JSON body
pub fn parse_device_info(body: &str) -> Result<DeviceInfo, DeviceError> {
    let response: InfoResponse = serde_json::from_str(body)?;
    let device = response.device;

    Ok(DeviceInfo {
        name: device.name,
        model: device.model_name,
        frame_tv_support: device.frame_tv_support == "true",
        power_state: device.power_state,
    })
}
