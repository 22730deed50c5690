//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use axum::{
    Router, http,
    http::{Method, header},
};
use gate::application::config::{ContractRegistry, GateConfig, ProcessState};
use gate::application::credential::JwtCredentialService;
use gate::infra::content::TokenContentProvider;
use gate::infra::rpc::EthRpcOracle;
use gate::infra::webhook::WebhookNotifier;
use gate::{KvStore, PgTokenUsageRepository, gate_router};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let config = gate_config_from_env()?;

    // JWT signing secret
    let jwt_secret = if cfg!(debug_assertions) {
        env::var("JWT_SECRET")
            .unwrap_or_else(|_| "development-only-secret-do-not-deploy!!".to_string())
    } else {
        env::var("JWT_SECRET").expect("JWT_SECRET must be set in production")
    };
    let credentials = JwtCredentialService::hs256(&jwt_secret, config.jwt.clone())?;

    // KV store: absent configuration selects the degraded fail-open mode
    let process_state = Arc::new(ProcessState::new());
    let kv = match (env::var("KV_REST_URL"), env::var("KV_REST_TOKEN")) {
        (Ok(url), Ok(token)) => KvStore::connect(url, token, process_state.clone())?,
        _ => KvStore::disabled(process_state.clone()),
    };
    process_state.log_startup_summary(&config, kv.security_mode());

    // Ownership oracle: contract address comes from the per-network registry
    let rpc_url = env::var("RPC_URL").expect("RPC_URL must be set in environment");
    let registry_path =
        env::var("CONTRACT_REGISTRY_PATH").unwrap_or_else(|_| "contracts.json".to_string());
    let registry = ContractRegistry::load(&registry_path)
        .with_context(|| format!("loading contract registry from {registry_path}"))?;
    let contract_address = registry
        .address_for(config.chain_id)
        .with_context(|| format!("no contract registered for chain {}", config.chain_id))?
        .to_string();
    let oracle = EthRpcOracle::new(rpc_url, contract_address)?;

    let usage = PgTokenUsageRepository::new(pool.clone());
    let webhook = WebhookNotifier::new(env::var("WEBHOOK_URL").ok())?;
    let content = TokenContentProvider::new(env::var("AUDIO_BASE_URL").ok());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(
            "/api",
            gate_router(kv, usage, oracle, content, webhook, credentials, config),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31113);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the gate configuration from environment overrides.
fn gate_config_from_env() -> anyhow::Result<GateConfig> {
    let mut config = GateConfig::default();

    if let Ok(raw) = env::var("CHAIN_ID") {
        config.chain_id = raw
            .parse()
            .with_context(|| format!("CHAIN_ID is not a number: {raw}"))?;
    }
    if let Ok(raw) = env::var("SIWE_ENABLED") {
        config.siwe_enabled = raw.eq_ignore_ascii_case("true") || raw == "1";
    }
    if let Ok(raw) = env::var("DOMAIN_ALLOWLIST") {
        let domains: Vec<String> = raw
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        if !domains.is_empty() {
            config.domain_allowlist = domains;
        }
    }

    Ok(config)
}
