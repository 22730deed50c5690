//! Gate Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::GateConfig;
use crate::application::credential::JwtCredentialService;
use crate::domain::repository::{
    ContentProvider, NonceRepository, NotificationSink, OwnershipOracle, RateLimitRepository,
    TokenUsageRepository,
};
use crate::infra::content::TokenContentProvider;
use crate::infra::kv::KvStore;
use crate::infra::postgres::PgTokenUsageRepository;
use crate::infra::rpc::EthRpcOracle;
use crate::infra::webhook::WebhookNotifier;
use crate::presentation::handlers::{self, GateAppState};

/// Create the gate router with the production adapters.
///
/// Unsupported verbs on these paths get axum's 405 with an `Allow`
/// header; OPTIONS preflight is handled by the CORS layer installed by
/// the binary.
pub fn gate_router(
    kv: KvStore,
    usage: PgTokenUsageRepository,
    oracle: EthRpcOracle,
    content: TokenContentProvider,
    webhook: WebhookNotifier,
    credentials: JwtCredentialService,
    config: GateConfig,
) -> Router {
    gate_router_generic(kv, usage, oracle, content, webhook, credentials, config)
}

/// Create a gate router for any set of repository implementations
pub fn gate_router_generic<K, U, O, C, W>(
    kv: K,
    usage: U,
    oracle: O,
    content: C,
    webhook: W,
    credentials: JwtCredentialService,
    config: GateConfig,
) -> Router
where
    K: NonceRepository + RateLimitRepository + Send + Sync + 'static,
    U: TokenUsageRepository + Send + Sync + 'static,
    O: OwnershipOracle + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    W: NotificationSink + Send + Sync + 'static,
{
    let state = GateAppState {
        kv: Arc::new(kv),
        usage: Arc::new(usage),
        oracle: Arc::new(oracle),
        content: Arc::new(content),
        webhook: Arc::new(webhook),
        credentials: Arc::new(credentials),
        config: Arc::new(config),
    };

    Router::new()
        .route("/nonce", get(handlers::issue_nonce::<K, U, O, C, W>))
        .route("/gate-access", post(handlers::gate_access::<K, U, O, C, W>))
        .route(
            "/form-submission-gate",
            post(handlers::form_submission::<K, U, O, C, W>),
        )
        .with_state(state)
}
