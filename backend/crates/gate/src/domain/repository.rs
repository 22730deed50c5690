//! Repository Traits
//!
//! Interfaces for the four external collaborators (KV store, database,
//! chain RPC, webhook) plus the content provider. Implementations live
//! in the infrastructure layer.

use crate::domain::entities::{ConsumeOutcome, ContentPayload, MarkUsedOutcome, Nonce, TokenRecord};
use crate::domain::value_objects::EthAddress;
use crate::error::GateResult;
use chrono::{DateTime, Utc};
use platform::rate_limit::{RateLimitConfig, RateLimitDecision};

/// Single-use nonce storage
#[trait_variant::make(NonceRepository: Send)]
pub trait LocalNonceRepository {
    /// Generate and store a nonce for a caller identifier with a TTL
    async fn issue(&self, identifier: &str, ttl_secs: u64) -> GateResult<Nonce>;

    /// Atomically read-and-delete the stored nonce and compare it to the
    /// candidate. Two concurrent calls with the correct value must not
    /// both observe `Valid`.
    async fn consume(&self, identifier: &str, candidate: &str) -> GateResult<ConsumeOutcome>;
}

/// Sliding-window rate limit counters
#[trait_variant::make(RateLimitRepository: Send)]
pub trait LocalRateLimitRepository {
    /// Count this request against `key`'s window and decide
    async fn check(&self, key: &str, config: &RateLimitConfig) -> GateResult<RateLimitDecision>;
}

/// Persistent token used/unused state
#[trait_variant::make(TokenUsageRepository: Send)]
pub trait LocalTokenUsageRepository {
    /// Fetch the usage record for a token id
    async fn get_usage(&self, token_id: u64) -> GateResult<Option<TokenRecord>>;

    /// Atomically transition the token from unused to used. The update
    /// is conditional on `used = false`; a token that is already used is
    /// reported as such, never overwritten.
    async fn mark_used(
        &self,
        token_id: u64,
        used_by: &EthAddress,
        used_at: DateTime<Utc>,
    ) -> GateResult<MarkUsedOutcome>;
}

/// Read-only on-chain ownership lookup
#[trait_variant::make(OwnershipOracle: Send)]
pub trait LocalOwnershipOracle {
    /// Whether `address` currently owns exactly `token_id`.
    /// Transport failures surface as errors, never as `false`.
    async fn owner_owns_token(&self, address: &EthAddress, token_id: u64) -> GateResult<bool>;
}

/// Gated content generation (best-effort once admission succeeds)
#[trait_variant::make(ContentProvider: Send)]
pub trait LocalContentProvider {
    async fn generate(&self, token_id: u64, address: &EthAddress) -> GateResult<ContentPayload>;
}

/// Payload for the outbound submission notification
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionNotice {
    pub token_id: u64,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outbound notification webhook
#[trait_variant::make(NotificationSink: Send)]
pub trait LocalNotificationSink {
    async fn notify(&self, notice: &SubmissionNotice) -> GateResult<()>;
}
