//! Dual-tier rate limiting
//!
//! Every gated route consumes from two windows: a tight per-route window
//! and a wide global window shared across routes. The per-route check
//! runs first and short-circuits, so a caller that trips it does not
//! burn global quota.

use crate::application::config::GateConfig;
use crate::domain::repository::RateLimitRepository;
use crate::error::{GateError, GateResult};
use platform::rate_limit::{RateLimitConfig, RateLimitDecision};
use std::sync::Arc;

/// The gated routes, as rate-limit key segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRoute {
    GateAccess,
    Nonce,
    FormSubmission,
}

impl GateRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateRoute::GateAccess => "gateAccess",
            GateRoute::Nonce => "nonce",
            GateRoute::FormSubmission => "formSubmission",
        }
    }

    fn limit<'c>(&self, config: &'c GateConfig) -> &'c RateLimitConfig {
        match self {
            GateRoute::GateAccess => &config.gate_access_limit,
            GateRoute::Nonce => &config.nonce_limit,
            GateRoute::FormSubmission => &config.submission_limit,
        }
    }
}

/// Applies the per-route and global windows for one request.
pub struct RateLimitGate<R> {
    repo: Arc<R>,
    config: Arc<GateConfig>,
}

impl<R: RateLimitRepository> RateLimitGate<R> {
    pub fn new(repo: Arc<R>, config: Arc<GateConfig>) -> Self {
        Self { repo, config }
    }

    /// Count this request against both tiers.
    ///
    /// Returns the per-route decision on success (its headers are the
    /// ones surfaced to clients). Either tier failing yields
    /// `GateError::RateLimited` carrying the failing tier's decision.
    pub async fn check(&self, identifier: &str, route: GateRoute) -> GateResult<RateLimitDecision> {
        let route_key = format!("rl:{}:{}", route.as_str(), identifier);
        let decision = self.repo.check(&route_key, route.limit(&self.config)).await?;
        if !decision.success {
            tracing::warn!(route = route.as_str(), identifier, "per-route rate limit hit");
            return Err(GateError::RateLimited(decision));
        }

        let global_key = format!("rl:global:{identifier}");
        let global = self.repo.check(&global_key, &self.config.global_limit).await?;
        if !global.success {
            tracing::warn!(identifier, "global rate limit hit");
            return Err(GateError::RateLimited(global));
        }

        Ok(decision)
    }
}
