//! Gate Error Types
//!
//! Gate-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. The orchestrator is the only layer
//! that picks public wording; every authentication sub-failure collapses
//! to the same 401 body so callers cannot learn which check failed.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitDecision;
use thiserror::Error;

/// Gate-specific result type alias
pub type GateResult<T> = Result<T, GateError>;

/// The specific check that rejected an authentication attempt.
///
/// Logged server-side only. Never serialized into a response: all of
/// these map to the identical `401 Authentication failed` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// SIWE or legacy message could not be parsed
    MessageMalformed,
    /// Nonce missing, expired, or not equal to the stored value
    NonceMismatch,
    /// Message domain not in the allowlist or not the resolved host
    DomainMismatch,
    /// Claimed address differs from the message address
    AddressMismatch,
    /// Recovered signer differs from the claimed address
    InvalidSignature,
    /// Message chain id differs from the configured chain
    ChainMismatch,
    /// Legacy timestamp older than the allowed skew
    TimestampExpired,
    /// Legacy timestamp further in the future than the leeway
    TimestampInFuture,
    /// Message not yet valid or past its own expiration time
    MessageWindow,
    /// Bearer token failed verification and no body auth was possible
    JwtRejected,
    /// Body token id does not match the verified credential's token id
    TokenIdMismatch,
    /// Required proof fields for the server's auth mode are absent
    MissingProofFields,
}

/// Gate-specific error variants
#[derive(Debug, Error)]
pub enum GateError {
    /// Request body failed schema validation
    #[error("Invalid request body: {0}")]
    Validation(String),

    /// Any authentication failure (uniform public surface)
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Caller does not own the claimed token on chain
    #[error("You do not own this token")]
    NotOwner,

    /// No usage record exists for the token id
    #[error("Token not found")]
    TokenNotFound,

    /// The token's single use has already been consumed
    #[error("This token has already been used")]
    TokenAlreadyUsed,

    /// Rate limit exceeded on one of the tiers
    #[error("Too many requests")]
    RateLimited(RateLimitDecision),

    /// SIWE flow requested but not enabled on this deployment
    #[error("SIWE not enabled")]
    SiweNotEnabled,

    /// Nonce could not be generated or stored
    #[error("Failed to generate nonce")]
    NonceGeneration(#[source] crate::infra::kv::KvError),

    /// KV store transport failure
    #[error("KV store error: {0}")]
    Kv(#[from] crate::infra::kv::KvError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Blockchain RPC transport or decode failure
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Outbound notification webhook failure
    #[error("Webhook error: {0}")]
    Webhook(String),

    /// Credential signing failure
    #[error("Signing error: {0}")]
    Signing(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Record the failing check server-side and return the uniform error.
    ///
    /// This is the single funnel for authentication rejections; callers
    /// must not construct responses from the reason.
    pub fn auth(reason: AuthFailure) -> Self {
        tracing::warn!(reason = ?reason, "authentication rejected");
        GateError::AuthenticationFailed
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::Validation(_) => StatusCode::BAD_REQUEST,
            GateError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            GateError::NotOwner | GateError::TokenAlreadyUsed => StatusCode::FORBIDDEN,
            GateError::TokenNotFound => StatusCode::NOT_FOUND,
            GateError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GateError::SiweNotEnabled => StatusCode::NOT_IMPLEMENTED,
            GateError::NonceGeneration(_)
            | GateError::Kv(_)
            | GateError::Database(_)
            | GateError::Rpc(_)
            | GateError::Webhook(_)
            | GateError::Signing(_)
            | GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::Validation(_) => ErrorKind::BadRequest,
            GateError::AuthenticationFailed => ErrorKind::Unauthorized,
            GateError::NotOwner | GateError::TokenAlreadyUsed => ErrorKind::Forbidden,
            GateError::TokenNotFound => ErrorKind::NotFound,
            GateError::RateLimited(_) => ErrorKind::TooManyRequests,
            GateError::SiweNotEnabled => ErrorKind::NotImplemented,
            _ => ErrorKind::InternalServerError,
        }
    }

    /// Public Problem JSON title. Deliberately vague for auth failures;
    /// internal variants never leak their message.
    fn title(&self) -> &'static str {
        match self {
            GateError::Validation(_) => "Invalid request body",
            GateError::AuthenticationFailed => "Authentication failed",
            GateError::NotOwner => "You do not own this token",
            GateError::TokenNotFound => "Token not found",
            GateError::TokenAlreadyUsed => "This token has already been used",
            GateError::RateLimited(_) => "Too many requests",
            GateError::SiweNotEnabled => "SIWE not enabled",
            GateError::NonceGeneration(_) => "Failed to generate nonce",
            _ => "Upstream failure",
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GateError::Database(e) => {
                tracing::error!(error = %e, "gate database error");
            }
            GateError::Kv(e) | GateError::NonceGeneration(e) => {
                tracing::error!(error = %e, "gate KV store error");
            }
            GateError::Rpc(msg) => {
                tracing::error!(message = %msg, "gate RPC error");
            }
            GateError::Webhook(msg) => {
                tracing::error!(message = %msg, "gate webhook error");
            }
            GateError::Signing(msg) | GateError::Internal(msg) => {
                tracing::error!(message = %msg, "gate internal error");
            }
            GateError::RateLimited(decision) => {
                tracing::warn!(limit = decision.limit, "gate rate limit exceeded");
            }
            GateError::AuthenticationFailed => {
                // Reason was already logged at the rejection site.
                tracing::debug!("authentication failed response");
            }
            _ => {
                tracing::debug!(error = %self, "gate error");
            }
        }
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        let app = AppError::new(err.kind(), err.title());
        match err {
            GateError::Validation(detail) => app.with_detail(detail),
            _ => app,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.log();

        let rate_limit = match &self {
            GateError::RateLimited(decision) => Some(decision.clone()),
            _ => None,
        };

        let app: AppError = self.into();

        if let Some(decision) = rate_limit {
            let now_ms = chrono::Utc::now().timestamp_millis();
            let retry_after = decision.retry_after_secs(now_ms);

            // The limit values go in the body as well as the headers so
            // clients without header access can still back off.
            let mut body = app.to_problem_json();
            body["limit"] = decision.limit.into();
            body["remaining"] = decision.remaining.into();
            body["retryAfter"] = retry_after.into();

            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(decision.limit),
            );
            headers.insert(
                "x-ratelimit-remaining",
                HeaderValue::from(decision.remaining),
            );
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                headers.insert(header::RETRY_AFTER, value);
            }
            return response;
        }

        app.into_response()
    }
}

impl From<platform::eth::RecoverError> for GateError {
    fn from(_: platform::eth::RecoverError) -> Self {
        GateError::auth(AuthFailure::InvalidSignature)
    }
}
