//! Application Configuration
//!
//! Configuration for the gate application layer, the per-network contract
//! registry, and the explicit process-level startup state.

use crate::domain::siwe::normalize_domain;
use platform::rate_limit::RateLimitConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How the service behaves when the external KV store is absent.
///
/// `Degraded` means nonce replay protection and rate limiting are
/// fail-open. It must be chosen explicitly (by not configuring the
/// store) and is logged at startup and on every fail-open decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Enforced,
    Degraded,
}

/// JWT issuance/verification settings
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: Vec<String>,
    pub access_ttl: Duration,
    /// Clock tolerance applied to `exp`/`iat` during verification
    pub leeway: Duration,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            issuer: "keygate".to_string(),
            audience: vec!["keygate".to_string()],
            access_ttl: Duration::from_secs(3600),
            leeway: Duration::from_secs(30),
        }
    }
}

/// Gate application configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Domains (normalized) the service accepts proofs for
    pub domain_allowlist: Vec<String>,
    /// The chain every proof must be bound to
    pub chain_id: u64,
    /// Whether the SIWE flow is enabled (else legacy-only)
    pub siwe_enabled: bool,
    /// Nonce TTL in the KV store
    pub nonce_ttl: Duration,
    /// Maximum age of a legacy timestamp
    pub max_skew: Duration,
    /// How far in the future a legacy timestamp may be
    pub future_leeway: Duration,
    /// Per-route limiter for POST /api/gate-access
    pub gate_access_limit: RateLimitConfig,
    /// Per-route limiter for GET /api/nonce
    pub nonce_limit: RateLimitConfig,
    /// Per-route limiter for POST /api/form-submission-gate
    pub submission_limit: RateLimitConfig,
    /// Global limiter shared by all routes (larger window)
    pub global_limit: RateLimitConfig,
    pub jwt: JwtSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            domain_allowlist: vec!["localhost".to_string()],
            chain_id: 11155111,
            siwe_enabled: true,
            nonce_ttl: Duration::from_secs(300),
            max_skew: Duration::from_secs(300),
            future_leeway: Duration::from_secs(60),
            gate_access_limit: RateLimitConfig::new(10, 60),
            nonce_limit: RateLimitConfig::new(20, 60),
            submission_limit: RateLimitConfig::new(5, 60),
            global_limit: RateLimitConfig::new(60, 600),
            jwt: JwtSettings::default(),
        }
    }
}

impl GateConfig {
    /// Config for development (localhost allowlist, SIWE on)
    pub fn development() -> Self {
        Self::default()
    }

    /// Whether a normalized domain is in the allowlist
    pub fn is_domain_allowed(&self, normalized: &str) -> bool {
        self.domain_allowlist
            .iter()
            .any(|d| normalize_domain(d) == normalized)
    }

    pub fn nonce_ttl_secs(&self) -> u64 {
        self.nonce_ttl.as_secs()
    }

    pub fn max_skew_ms(&self) -> i64 {
        self.max_skew.as_millis() as i64
    }

    pub fn future_leeway_ms(&self) -> i64 {
        self.future_leeway.as_millis() as i64
    }
}

/// One network entry in the contract registry document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
    pub contract_address: String,
}

/// File-based contract-address registry, one JSON document keyed by
/// chain id. Owned and written externally; this service only reads it.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ContractRegistry {
    networks: HashMap<String, NetworkEntry>,
}

impl ContractRegistry {
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(std::io::Error::other)
    }

    pub fn address_for(&self, chain_id: u64) -> Option<&str> {
        self.networks
            .get(&chain_id.to_string())
            .map(|entry| entry.contract_address.as_str())
    }
}

/// Explicit process-level state.
///
/// Replaces ambient "log this once" globals: constructed at startup,
/// owned by the app state, passed by reference.
#[derive(Debug, Default)]
pub struct ProcessState {
    degraded_noted: AtomicBool,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the configuration summary once at startup.
    pub fn log_startup_summary(&self, config: &GateConfig, mode: SecurityMode) {
        tracing::info!(
            chain_id = config.chain_id,
            siwe_enabled = config.siwe_enabled,
            domains = ?config.domain_allowlist,
            security_mode = ?mode,
            "gate configuration loaded"
        );
        if mode == SecurityMode::Degraded {
            self.note_degraded();
        }
    }

    /// Record that the service is running fail-open. Returns true the
    /// first time so the full warning is emitted exactly once; later
    /// calls log at debug level.
    pub fn note_degraded(&self) -> bool {
        let first = !self.degraded_noted.swap(true, Ordering::Relaxed);
        if first {
            tracing::warn!(
                "KV store not configured: nonce replay protection and rate \
                 limiting are DISABLED (SecurityMode::Degraded). Do not run \
                 this mode in production."
            );
        } else {
            tracing::debug!("fail-open decision in degraded security mode");
        }
        first
    }
}
