use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use waypoint_api::auth::handlers::{login, me, signup};
use waypoint_api::outreach::handlers::{contact_submit, waitlist_subscribe};
use waypoint_api::{health_check, ApiError, AppState, Settings};

#[actix_web::main]
async fn main() -> waypoint_api::Result<()> {
    dotenv().ok();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    // Fails here when the signing secret is absent: the process must not
    // start without it.
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Periodic sweep of expired rate-limit windows.
    let sweep_state = state.clone();
    let sweep_interval = Duration::from_secs(config.rate_limit.sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            sweep_state.rate_limiter.sweep().await;
        }
    });

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);
    let workers = config.server.workers as usize;

    HttpServer::new(move || {
        let cors = if config.cors.enabled {
            let cors_config = Cors::default();
            let cors_config = if config.cors.allow_any_origin {
                cors_config
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
            } else {
                cors_config
                    .allowed_origin("https://waypoint.dev")
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
                    .supports_credentials()
            };
            cors_config.max_age(config.cors.max_age as usize)
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/login", web::post().to(login))
            .route("/auth/me", web::get().to(me))
            .route("/contact", web::post().to(contact_submit))
            .route("/waitlist/subscribe", web::post().to(waitlist_subscribe))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(())
}
