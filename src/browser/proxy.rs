use std::time::Duration;

use tracing::{info, warn};

use crate::errors::{AutomationError, Result};
use crate::types::ProxyConfig;

const PROBE_URL: &str = "http://ipinfo.io/ip";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One bounded outbound request through the candidate proxy. Returns whether
/// the proxy answered; the caller decides what an unreachable proxy means.
pub async fn probe_proxy(config: &ProxyConfig) -> Result<bool> {
    info!("Testing proxy connectivity: {}", config.server);

    let mut proxy = reqwest::Proxy::all(&config.server).map_err(|e| {
        AutomationError::Configuration(format!(
            "invalid proxy server '{}': {}",
            config.server, e
        ))
    })?;

    if let Some(username) = &config.username {
        proxy = proxy.basic_auth(username, config.password.as_deref().unwrap_or_default());
    }

    let client = reqwest::Client::builder()
        .proxy(proxy)
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| AutomationError::Engine(e.to_string()))?;

    match client.get(PROBE_URL).send().await {
        Ok(response) => {
            let ip = response.text().await.unwrap_or_default();
            info!("Proxy connectivity confirmed, egress IP: {}", ip.trim());
            Ok(true)
        }
        Err(err) => {
            warn!("Proxy connectivity test failed: {}", err);
            Ok(false)
        }
    }
}
