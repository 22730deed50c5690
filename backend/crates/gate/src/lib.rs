//! Token Gate Backend Module
//!
//! Exchanges proof of NFT key ownership for bounded-lifetime access
//! credentials and gated content.
//!
//! Clean Architecture structure:
//! - `domain/` - entities, value objects, SIWE/legacy message logic, repository traits
//! - `application/` - use cases (nonce issuance, gate access, form submission)
//! - `infra/` - KV store, Postgres, JSON-RPC oracle, webhook, content provider
//! - `presentation/` - HTTP handlers
//!
//! ## Security Model
//! - Three verification paths: bearer JWT (fast path), SIWE handshake,
//!   legacy signed-message handshake; classified once, dispatched exhaustively
//! - Every verification failure collapses to one uniform 401 response;
//!   the failing check is visible only in server-side logs
//! - Nonces are single-use (atomic read-and-delete in the external store)
//! - Token consumption is one atomic conditional update, never reverted
//! - Without the external KV store the service runs fail-open
//!   (`SecurityMode::Degraded`): no nonce replay protection, no rate
//!   limiting. This is an explicit operating mode for development, not a
//!   production default.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{GateConfig, ProcessState, SecurityMode};
pub use error::{GateError, GateResult};
pub use infra::kv::KvStore;
pub use infra::postgres::PgTokenUsageRepository;
pub use presentation::router::gate_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};
