pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod outreach;
pub mod store;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpResponse;

pub use auth::{RateLimiter, TokenService};
pub use config::Settings;
pub use error::ApiError;
pub use notify::{HttpNotifier, NoopNotifier, Notifier};
pub use store::{DocumentStore, MemoryStore, PgStore};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all handlers. Every collaborator is an
/// explicitly-owned, injected component so tests can build isolated
/// instances with in-process substitutes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn Notifier>,
    pub rate_limiter: Arc<RateLimiter>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Production wiring: Postgres store, HTTP notifier when configured.
    pub async fn new(settings: Settings) -> Result<Self> {
        let store = PgStore::connect(
            &settings.database.url,
            settings.database.max_connections,
            Duration::from_secs(settings.database.timeout_secs),
        )
        .await?;

        let notifier: Arc<dyn Notifier> =
            if settings.notify.email_enabled() || settings.notify.list_enabled() {
                Arc::new(
                    HttpNotifier::new(settings.notify.clone())
                        .map_err(|e| ApiError::Config(e.to_string()))?,
                )
            } else {
                Arc::new(NoopNotifier)
            };

        Ok(Self::with_parts(settings, Arc::new(store), notifier))
    }

    /// Explicit wiring, used by tests and by `new`.
    pub fn with_parts(
        settings: Settings,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            &settings.auth.jwt_secret,
            settings.auth.token_ttl_hours,
        ));
        Self {
            config: Arc::new(settings),
            store,
            notifier,
            rate_limiter: Arc::new(RateLimiter::new()),
            tokens,
        }
    }
}
