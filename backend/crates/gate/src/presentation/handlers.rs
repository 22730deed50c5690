//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, header};
use std::net::SocketAddr;
use std::sync::Arc;

use platform::client::{caller_identifier, request_host};

use crate::application::config::GateConfig;
use crate::application::credential::{JwtCredentialService, extract_bearer};
use crate::application::gate_access::{GateAccessInput, GateAccessUseCase};
use crate::application::issue_nonce::IssueNonceUseCase;
use crate::application::submit_gate::{FormSubmissionInput, FormSubmissionUseCase};
use crate::domain::repository::{
    ContentProvider, NonceRepository, NotificationSink, OwnershipOracle, RateLimitRepository,
    TokenUsageRepository,
};
use crate::error::{GateError, GateResult};
use crate::presentation::dto::{
    FormSubmissionRequest, FormSubmissionResponse, GateAccessRequest, GateAccessResponse,
    NonceResponse,
};

/// Shared state for gate handlers
pub struct GateAppState<K, U, O, C, W> {
    pub kv: Arc<K>,
    pub usage: Arc<U>,
    pub oracle: Arc<O>,
    pub content: Arc<C>,
    pub webhook: Arc<W>,
    pub credentials: Arc<JwtCredentialService>,
    pub config: Arc<GateConfig>,
}

// Manual impl: derive(Clone) would require the type parameters to be
// Clone, but only the Arcs are cloned.
impl<K, U, O, C, W> Clone for GateAppState<K, U, O, C, W> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            usage: self.usage.clone(),
            oracle: self.oracle.clone(),
            content: self.content.clone(),
            webhook: self.webhook.clone(),
            credentials: self.credentials.clone(),
            config: self.config.clone(),
        }
    }
}

fn decoded<T>(body: Result<Json<T>, JsonRejection>) -> GateResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(GateError::Validation(rejection.body_text())),
    }
}

/// GET /api/nonce
pub async fn issue_nonce<K, U, O, C, W>(
    State(state): State<GateAppState<K, U, O, C, W>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> GateResult<Json<NonceResponse>>
where
    K: NonceRepository + RateLimitRepository + Send + Sync + 'static,
    U: TokenUsageRepository + Send + Sync + 'static,
    O: OwnershipOracle + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    W: NotificationSink + Send + Sync + 'static,
{
    let identifier = caller_identifier(&headers, Some(addr.ip()));

    let use_case = IssueNonceUseCase::new(state.kv.clone(), state.config.clone());
    let output = use_case.execute(&identifier).await?;

    Ok(Json(NonceResponse {
        nonce: output.nonce,
    }))
}

/// POST /api/gate-access
pub async fn gate_access<K, U, O, C, W>(
    State(state): State<GateAppState<K, U, O, C, W>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<GateAccessRequest>, JsonRejection>,
) -> GateResult<Json<GateAccessResponse>>
where
    K: NonceRepository + RateLimitRepository + Send + Sync + 'static,
    U: TokenUsageRepository + Send + Sync + 'static,
    O: OwnershipOracle + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    W: NotificationSink + Send + Sync + 'static,
{
    let req = decoded(body)?;
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
        .map(str::to_string);

    let use_case = GateAccessUseCase::new(
        state.kv.clone(),
        state.usage.clone(),
        state.oracle.clone(),
        state.content.clone(),
        state.credentials.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(GateAccessInput {
            identifier: caller_identifier(&headers, Some(addr.ip())),
            host: request_host(&headers),
            path: "/api/gate-access".to_string(),
            method: "POST".to_string(),
            bearer,
            address: req.address,
            signature: req.signature,
            token_id: req.token_id,
            timestamp_ms: req.timestamp,
            message: req.message,
            nonce: req.nonce,
        })
        .await?;

    Ok(Json(GateAccessResponse {
        success: true,
        access: "granted",
        content: output.content,
        access_token: output.access_token,
    }))
}

/// POST /api/form-submission-gate
pub async fn form_submission<K, U, O, C, W>(
    State(state): State<GateAppState<K, U, O, C, W>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<FormSubmissionRequest>, JsonRejection>,
) -> GateResult<Json<FormSubmissionResponse>>
where
    K: NonceRepository + RateLimitRepository + Send + Sync + 'static,
    U: TokenUsageRepository + Send + Sync + 'static,
    O: OwnershipOracle + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    W: NotificationSink + Send + Sync + 'static,
{
    let req = decoded(body)?;

    let use_case = FormSubmissionUseCase::new(
        state.kv.clone(),
        state.usage.clone(),
        state.oracle.clone(),
        state.webhook.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(FormSubmissionInput {
            identifier: caller_identifier(&headers, Some(addr.ip())),
            host: request_host(&headers),
            path: "/api/form-submission-gate".to_string(),
            method: "POST".to_string(),
            address: req.address,
            signature: req.signature,
            token_id: req.token_id,
            timestamp_ms: req.timestamp,
            name: req.name,
            message: req.message,
        })
        .await?;

    Ok(Json(FormSubmissionResponse {
        success: true,
        token_id: output.token_id,
        used_by: output.used_by,
    }))
}
