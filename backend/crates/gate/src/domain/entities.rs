//! Domain Entities

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A single-use random value binding one sign-in attempt to one caller.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub value: String,
    pub identifier: String,
    pub expires_at: DateTime<Utc>,
}

impl Nonce {
    /// Generate a fresh nonce for a caller identifier.
    pub fn generate(identifier: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            value: platform::crypto::random_hex(16),
            identifier: identifier.into(),
            expires_at: Utc::now() + Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Outcome of an atomic nonce consumption.
///
/// Missing, expired, and mismatched candidates are deliberately
/// indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Valid,
    Mismatch,
}

impl ConsumeOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ConsumeOutcome::Valid)
    }
}

/// Persistent used/unused state of a key token.
///
/// Created externally at mint time; `used` transitions to `true` at most
/// once and never reverts.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub token_id: i64,
    pub used: bool,
    pub used_by: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Outcome of the atomic token consumption update.
#[derive(Debug, Clone)]
pub enum MarkUsedOutcome {
    /// This call performed the unused -> used transition
    Marked(TokenRecord),
    /// The token was already consumed by an earlier call
    AlreadyUsed,
    /// No record exists for the token id
    NotFound,
}

/// Content returned once admission succeeds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPayload {
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub audio_error: bool,
}

impl ContentPayload {
    /// Fallback payload when content generation fails.
    ///
    /// Admission already succeeded at this point, so the request is
    /// answered with degraded content instead of an error.
    pub fn fallback(token_id: u64) -> Self {
        Self {
            title: format!("Key #{token_id}"),
            message: "Your key has been verified. Content is temporarily unavailable.".to_string(),
            audio_url: None,
            audio_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_generation() {
        let nonce = Nonce::generate("1.2.3.4", 300);
        assert_eq!(nonce.value.len(), 32);
        assert_eq!(nonce.identifier, "1.2.3.4");
        assert!(!nonce.is_expired());

        let other = Nonce::generate("1.2.3.4", 300);
        assert_ne!(nonce.value, other.value);
    }

    #[test]
    fn test_expired_nonce() {
        let nonce = Nonce::generate("1.2.3.4", 0);
        assert!(nonce.is_expired());
    }

    #[test]
    fn test_consume_outcome() {
        assert!(ConsumeOutcome::Valid.is_valid());
        assert!(!ConsumeOutcome::Mismatch.is_valid());
    }

    #[test]
    fn test_fallback_payload_flags_audio_error() {
        let payload = ContentPayload::fallback(42);
        assert!(payload.audio_error);
        assert!(payload.audio_url.is_none());
        assert!(payload.title.contains("42"));
    }
}
