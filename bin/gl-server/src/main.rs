//! GuestList API Server
//!
//! Production server for the guest-management REST APIs:
//! - Auth APIs: register, login, refresh, logout, me
//! - Venue APIs: fetch, update, event listing
//! - Event APIs: create, list, fetch, update, delete, guest list, lifecycle
//! - Guest APIs: add, fetch, manual check-in
//! - Ticket APIs: issue, fetch, validate (check-in), revoke
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GL_API_PORT` | `8080` | HTTP API port |
//! | `GL_DATABASE_URL` | `postgres://localhost/guestlist` | Postgres connection URL |
//! | `GL_REDIS_URL` | `redis://localhost:6379` | Redis connection URL |
//! | `GL_SIGNING_SECRET` | - | Shared HMAC signing secret (required) |
//! | `GL_ACCESS_TOKEN_TTL_HOURS` | `24` | Access-token lifetime |
//! | `GL_REFRESH_TOKEN_TTL_DAYS` | `30` | Refresh-token lifetime |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Extension, Router};
use sqlx::postgres::PgPoolOptions;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gl_auth::{AuthConfig, AuthGate, RedisRevocationStore, RevocationStore, TicketSigner, TokenCodec};
use gl_platform::api::{
    auth_router, events_router, guests_router, tickets_router, venues_router, ApiDoc, AppState,
    AuthApiState, EventsState, GuestsState, TicketsState, VenuesState,
};
use gl_platform::repository::{
    init_schema, PostgresEventRepository, PostgresGuestRepository, PostgresTicketRepository,
    PostgresUserRepository, PostgresVenueRepository,
};
use gl_platform::service::{PasswordService, TicketValidationService};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting GuestList API Server");

    let api_port: u16 = env_or_parse("GL_API_PORT", 8080);
    let database_url = env_or("GL_DATABASE_URL", "postgres://localhost/guestlist");
    let redis_url = env_or("GL_REDIS_URL", "redis://localhost:6379");
    let auth_config = AuthConfig::from_env().context("Auth configuration")?;

    // Connect to Postgres
    info!("Connecting to Postgres");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .context("Postgres connection")?;
    init_schema(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Schema init failed: {}", e))?;

    // Connect to Redis
    info!("Connecting to Redis");
    let store: Arc<dyn RevocationStore> = Arc::new(
        RedisRevocationStore::connect(&redis_url)
            .await
            .map_err(|e| anyhow::anyhow!("Redis connection failed: {}", e))?,
    );

    // Repositories
    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let venues = Arc::new(PostgresVenueRepository::new(pool.clone()));
    let events = Arc::new(PostgresEventRepository::new(pool.clone()));
    let guests = Arc::new(PostgresGuestRepository::new(pool.clone()));
    let tickets = Arc::new(PostgresTicketRepository::new(pool.clone()));
    info!("Repositories initialized");

    // Auth services
    let codec = TokenCodec::new(&auth_config.signing_secret);
    let signer = TicketSigner::new(&auth_config.signing_secret);
    let gate = Arc::new(AuthGate::new(codec.clone(), store.clone()));
    let password_service = Arc::new(PasswordService::new());
    info!("Auth services initialized");

    let app_state = AppState { gate };

    let auth_state = AuthApiState {
        users,
        venues: venues.clone(),
        password_service,
        codec,
        store: store.clone(),
        config: auth_config,
    };
    let venues_state = VenuesState {
        venues,
        events: events.clone(),
    };

    let validation = Arc::new(TicketValidationService::new(
        signer.clone(),
        tickets.clone(),
        guests.clone(),
        events.clone(),
    ));
    let tickets_state = TicketsState {
        validation,
        tickets,
        guests: guests.clone(),
        events: events.clone(),
        signer,
    };
    let events_state = EventsState {
        events: events.clone(),
        guests: guests.clone(),
    };
    let guests_state = GuestsState { guests, events };

    let app = Router::new()
        .nest("/api/v1/auth", auth_router(auth_state))
        .nest("/api/v1/venues", venues_router(venues_state))
        .nest("/api/v1/events", events_router(events_state))
        .nest("/api/v1/guests", guests_router(guests_state))
        .nest("/api/v1/tickets", tickets_router(tickets_state))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("GuestList API Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
