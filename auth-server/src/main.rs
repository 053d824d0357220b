// auth-server/src/main.rs
use std::time::Duration;

use actix_web::{App, HttpServer};
use auth_server::middleware::RateLimiter;
use auth_server::AppState;
use common::{setup_tracing, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    // Save what the server itself needs before moving config into the state
    let server_addr = config.server_addr.clone();
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let rate_limiter = RateLimiter::new(
        vec!["/api/createSignInData".to_string()],
        &config.rate_limit,
    );

    tracing::info!(
        "Starting sign-in server on {} for domain {}",
        server_addr,
        config.expected_domain
    );

    let state = AppState::new(config);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(rate_limiter.clone())
            .configure(move |cfg| state.configure(cfg))
    })
    .client_request_timeout(request_timeout)
    .bind(&server_addr)?
    .run()
    .await
}
