//! Endpoint resolution: public IP via an HTTP service, local IP via the
//! interface table. Both are best-effort advice for the operator; the session
//! itself never depends on them.

use std::net::IpAddr;
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("peerchat/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("public IP lookup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IP service returned an invalid address: {0:?}")]
    InvalidAddress(String),
    #[error("no usable local interface address: {0}")]
    Local(#[from] local_ip_address::Error),
}

/// Ask `url` (a plain-text what-is-my-ip service) for our public address.
pub async fn public_ip(url: &str) -> Result<IpAddr, ResolveError> {
    let client = reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let trimmed = body.trim();
    trimmed
        .parse()
        .map_err(|_| ResolveError::InvalidAddress(trimmed.to_string()))
}

/// Primary non-loopback interface address, for peers on the same network.
pub fn local_ip() -> Result<IpAddr, ResolveError> {
    Ok(local_ip_address::local_ip()?)
}
