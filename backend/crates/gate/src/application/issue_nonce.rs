//! Nonce issuance use case

use crate::application::config::GateConfig;
use crate::application::rate_limit::{GateRoute, RateLimitGate};
use crate::domain::repository::{NonceRepository, RateLimitRepository};
use crate::error::{GateError, GateResult};
use std::sync::Arc;

/// Output of nonce issuance
#[derive(Debug)]
pub struct IssueNonceOutput {
    pub nonce: String,
}

/// Issues a fresh single-use nonce for the SIWE flow.
pub struct IssueNonceUseCase<K> {
    kv: Arc<K>,
    config: Arc<GateConfig>,
}

impl<K> IssueNonceUseCase<K>
where
    K: NonceRepository + RateLimitRepository,
{
    pub fn new(kv: Arc<K>, config: Arc<GateConfig>) -> Self {
        Self { kv, config }
    }

    pub async fn execute(&self, identifier: &str) -> GateResult<IssueNonceOutput> {
        RateLimitGate::new(self.kv.clone(), self.config.clone())
            .check(identifier, GateRoute::Nonce)
            .await?;

        if !self.config.siwe_enabled {
            return Err(GateError::SiweNotEnabled);
        }

        let nonce = self
            .kv
            .issue(identifier, self.config.nonce_ttl_secs())
            .await
            .map_err(|e| match e {
                GateError::Kv(inner) => GateError::NonceGeneration(inner),
                other => other,
            })?;

        tracing::info!(identifier, "nonce issued");
        Ok(IssueNonceOutput { nonce: nonce.value })
    }
}
