//! Form submission use case
//!
//! The consuming flow: the same legacy verification shape as gate
//! access, then ownership, then the single-use token transition. The
//! webhook fires before the token is marked used so a notification
//! failure surfaces as a 500 without burning the caller's token; the
//! mark itself is an atomic conditional update, so two concurrent
//! submissions can never both succeed.

use crate::application::config::GateConfig;
use crate::application::rate_limit::{GateRoute, RateLimitGate};
use crate::application::verify_legacy::{LegacyVerifier, LegacyVerifyInput};
use crate::domain::entities::MarkUsedOutcome;
use crate::domain::repository::{
    NotificationSink, OwnershipOracle, RateLimitRepository, SubmissionNotice, TokenUsageRepository,
};
use crate::domain::value_objects::EthAddress;
use crate::error::{GateError, GateResult};
use std::sync::Arc;

/// One form-submission request after transport decoding.
#[derive(Debug)]
pub struct FormSubmissionInput {
    pub identifier: String,
    pub host: Option<String>,
    pub path: String,
    pub method: String,
    pub address: String,
    pub signature: String,
    pub token_id: u64,
    pub timestamp_ms: i64,
    pub name: Option<String>,
    pub message: Option<String>,
}

/// Successful submission result
#[derive(Debug)]
pub struct FormSubmissionOutput {
    pub token_id: u64,
    pub used_by: String,
}

/// Orchestrates one consuming submission.
pub struct FormSubmissionUseCase<K, U, O, W> {
    kv: Arc<K>,
    usage: Arc<U>,
    oracle: Arc<O>,
    webhook: Arc<W>,
    config: Arc<GateConfig>,
}

impl<K, U, O, W> FormSubmissionUseCase<K, U, O, W>
where
    K: RateLimitRepository,
    U: TokenUsageRepository,
    O: OwnershipOracle,
    W: NotificationSink,
{
    pub fn new(
        kv: Arc<K>,
        usage: Arc<U>,
        oracle: Arc<O>,
        webhook: Arc<W>,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            kv,
            usage,
            oracle,
            webhook,
            config,
        }
    }

    pub async fn execute(&self, input: FormSubmissionInput) -> GateResult<FormSubmissionOutput> {
        RateLimitGate::new(self.kv.clone(), self.config.clone())
            .check(&input.identifier, GateRoute::FormSubmission)
            .await?;

        let address = EthAddress::parse(&input.address)
            .map_err(|e| GateError::Validation(format!("address: {e}")))?;

        LegacyVerifier::new(self.config.clone()).verify(LegacyVerifyInput {
            address: &address,
            signature: &input.signature,
            token_id: input.token_id,
            timestamp_ms: input.timestamp_ms,
            request_host: input.host.as_deref(),
            path: &input.path,
            method: &input.method,
        })?;

        let owns = self
            .oracle
            .owner_owns_token(&address, input.token_id)
            .await?;
        if !owns {
            return Err(GateError::NotOwner);
        }

        match self.usage.get_usage(input.token_id).await? {
            None => return Err(GateError::TokenNotFound),
            Some(record) if record.used => return Err(GateError::TokenAlreadyUsed),
            Some(_) => {}
        }

        self.webhook
            .notify(&SubmissionNotice {
                token_id: input.token_id,
                address: address.as_str().to_string(),
                name: input.name.clone(),
                message: input.message.clone(),
            })
            .await?;

        let outcome = self
            .usage
            .mark_used(input.token_id, &address, chrono::Utc::now())
            .await?;
        match outcome {
            MarkUsedOutcome::Marked(record) => {
                tracing::info!(
                    token_id = input.token_id,
                    address = %address,
                    "token consumed by submission"
                );
                Ok(FormSubmissionOutput {
                    token_id: input.token_id,
                    used_by: record.used_by.unwrap_or_else(|| address.as_str().to_string()),
                })
            }
            // Lost the race after the pre-check.
            MarkUsedOutcome::AlreadyUsed => Err(GateError::TokenAlreadyUsed),
            MarkUsedOutcome::NotFound => Err(GateError::TokenNotFound),
        }
    }
}
