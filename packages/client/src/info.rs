//! One-shot server query over the HTTP API.

use reqwest::Url;
use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotUsage {
    pub used: u32,
    pub free: u32,
}

/// Body of `GET /api/server`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    pub host_name: String,
    pub mission: Option<String>,
    pub sequence: u32,
    pub mission_running: bool,
    pub public_slots: SlotUsage,
    pub private_slots: SlotUsage,
}

/// Map the WebSocket endpoint to the server info endpoint on the same host.
pub fn info_url(ws_url: &str) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(ws_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", ws_url, e)))?;
    let scheme = match url.scheme() {
        "ws" => "http",
        "wss" => "https",
        other => {
            return Err(ClientError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                ws_url, other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::InvalidUrl(ws_url.to_string()))?;
    url.set_path("/api/server");
    url.set_query(None);
    Ok(url)
}

pub async fn fetch_server_info(ws_url: &str) -> Result<ServerInfo, ClientError> {
    let url = info_url(ws_url)?;
    tracing::debug!("Fetching {}", url);

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    response
        .json::<ServerInfo>()
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}
