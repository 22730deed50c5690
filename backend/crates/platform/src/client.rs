//! Client identification utilities
//!
//! Common functions for identifying callers via HTTP headers.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Identifier used for development setups where no proxy headers exist.
pub const LOCAL_CALLER_ID: &str = "127.0.0.1";

/// Resolve the caller identifier used for rate limiting and nonce binding.
///
/// Prefers the first hop of `X-Forwarded-For` (reverse proxy setups),
/// then the direct connection IP, then a fixed local identifier so that
/// development environments without a proxy still get stable keys.
pub fn caller_identifier(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> String {
    if let Some(ip) = forwarded_for_ip(headers) {
        return ip.to_string();
    }
    match direct_ip {
        Some(ip) => ip.to_string(),
        None => LOCAL_CALLER_ID.to_string(),
    }
}

/// First valid IP in the `X-Forwarded-For` list, if any.
pub fn forwarded_for_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;
    xff.split(',').next()?.trim().parse::<IpAddr>().ok()
}

/// Resolve the host the request was addressed to.
///
/// Prefers `X-Forwarded-Host` (reverse proxy setups), then `Host`.
/// Any port suffix is stripped; the result is lowercased.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(axum::http::header::HOST))
        .and_then(|v| v.to_str().ok())?;

    let host = raw.split(',').next()?.trim();
    let host = host.rsplit_once(':').map_or(host, |(name, port)| {
        // Only treat the suffix as a port when it is numeric; IPv6
        // literals contain colons too.
        if port.chars().all(|c| c.is_ascii_digit()) {
            name
        } else {
            host
        }
    });

    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
