//! HTTP KV store adapter
//!
//! Talks to a Redis-compatible REST store (path-segment commands, Bearer
//! auth, `{"result": ...}` envelopes). Implements both nonce storage and
//! rate-limit counters; the store's atomic GETDEL and INCR primitives
//! are what make nonce single-use and counter windows correct across
//! stateless replicas.
//!
//! When no store is configured the adapter runs fail-open: every nonce
//! validates, every rate check passes. That is `SecurityMode::Degraded`
//! and each fail-open decision is routed through `ProcessState`.

use crate::application::config::{ProcessState, SecurityMode};
use crate::domain::entities::{ConsumeOutcome, Nonce};
use crate::domain::repository::{NonceRepository, RateLimitRepository};
use crate::error::GateResult;
use platform::rate_limit::{RateLimitConfig, RateLimitDecision};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// KV store transport error
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("KV request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("KV store returned status {0}")]
    Status(u16),
    #[error("unexpected KV response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct Envelope {
    result: serde_json::Value,
}

/// Configured REST connection
struct HttpKv {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpKv {
    /// Run one command encoded as URL path segments.
    async fn command(&self, segments: &[&str]) -> Result<serde_json::Value, KvError> {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencode(segment));
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(KvError::Status(response.status().as_u16()));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| KvError::Decode(e.to_string()))?;
        Ok(envelope.result)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        self.command(&["set", key, value, "ex", &ttl_secs.to_string()])
            .await?;
        Ok(())
    }

    async fn getdel(&self, key: &str) -> Result<Option<String>, KvError> {
        match self.command(&["getdel", key]).await? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s)),
            other => Err(KvError::Decode(format!("getdel returned {other}"))),
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, KvError> {
        self.command(&["incr", key])
            .await?
            .as_i64()
            .ok_or_else(|| KvError::Decode("incr returned non-integer".to_string()))
    }

    async fn pexpire(&self, key: &str, ms: i64) -> Result<(), KvError> {
        self.command(&["pexpire", key, &ms.to_string()]).await?;
        Ok(())
    }

    async fn pttl(&self, key: &str) -> Result<i64, KvError> {
        self.command(&["pttl", key])
            .await?
            .as_i64()
            .ok_or_else(|| KvError::Decode("pttl returned non-integer".to_string()))
    }
}

/// Nonce and rate-limit store backed by the REST KV service, or a
/// fail-open stand-in when none is configured.
pub struct KvStore {
    inner: Option<HttpKv>,
    state: Arc<ProcessState>,
}

impl KvStore {
    /// Connect to a REST KV endpoint.
    pub fn connect(base_url: String, token: String, state: Arc<ProcessState>) -> GateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(KvError::Http)?;
        Ok(Self {
            inner: Some(HttpKv {
                client,
                base_url,
                token,
            }),
            state,
        })
    }

    /// Explicitly disabled store: every nonce validates and every rate
    /// check passes.
    pub fn disabled(state: Arc<ProcessState>) -> Self {
        Self { inner: None, state }
    }

    pub fn security_mode(&self) -> SecurityMode {
        if self.inner.is_some() {
            SecurityMode::Enforced
        } else {
            SecurityMode::Degraded
        }
    }

    fn nonce_key(identifier: &str) -> String {
        format!("nonce:{identifier}")
    }
}

impl NonceRepository for KvStore {
    async fn issue(&self, identifier: &str, ttl_secs: u64) -> GateResult<Nonce> {
        let nonce = Nonce::generate(identifier, ttl_secs);
        if let Some(kv) = &self.inner {
            kv.set_ex(&Self::nonce_key(identifier), &nonce.value, ttl_secs)
                .await
                .map_err(crate::error::GateError::Kv)?;
        } else {
            self.state.note_degraded();
        }
        Ok(nonce)
    }

    async fn consume(&self, identifier: &str, candidate: &str) -> GateResult<ConsumeOutcome> {
        let Some(kv) = &self.inner else {
            self.state.note_degraded();
            return Ok(ConsumeOutcome::Valid);
        };

        // GETDEL is the atomicity point: whatever the comparison says,
        // the stored value is gone and can never validate again.
        let stored = kv
            .getdel(&Self::nonce_key(identifier))
            .await
            .map_err(crate::error::GateError::Kv)?;
        match stored {
            Some(value)
                if platform::crypto::constant_time_eq(value.as_bytes(), candidate.as_bytes()) =>
            {
                Ok(ConsumeOutcome::Valid)
            }
            _ => Ok(ConsumeOutcome::Mismatch),
        }
    }
}

impl RateLimitRepository for KvStore {
    async fn check(&self, key: &str, config: &RateLimitConfig) -> GateResult<RateLimitDecision> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let Some(kv) = &self.inner else {
            self.state.note_degraded();
            return Ok(RateLimitDecision::pass_through(
                config.max_requests,
                now_ms,
            ));
        };

        let count = kv.incr(key).await.map_err(crate::error::GateError::Kv)?;
        if count == 1 {
            kv.pexpire(key, config.window_ms())
                .await
                .map_err(crate::error::GateError::Kv)?;
        }

        // PTTL can report no expiry if the PEXPIRE above raced a crash;
        // fall back to a full window in that case.
        let ttl_ms = kv.pttl(key).await.map_err(crate::error::GateError::Kv)?;
        let reset_at_ms = if ttl_ms > 0 {
            now_ms + ttl_ms
        } else {
            now_ms + config.window_ms()
        };

        let success = count <= config.max_requests as i64;
        let remaining = (config.max_requests as i64 - count).max(0) as u32;
        Ok(RateLimitDecision {
            success,
            limit: config.max_requests,
            remaining,
            reset_at_ms,
        })
    }
}

/// Percent-encode a path segment. Keys and values here are hex strings
/// and `rl:`-prefixed identifiers, so only a few characters need care.
fn urlencode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b':' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
