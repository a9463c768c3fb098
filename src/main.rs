use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use ev_dealer_api::appointments::spawn_expiry_sweep;
use ev_dealer_api::config::AppConfig;
use ev_dealer_api::{create_router, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ev_dealer_api=debug")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("EV Dealer API - Starting...");
    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let state = AppState::new(pool, &config);

    if let Some((username, password)) = &config.bootstrap_admin {
        if state.auth.ensure_admin(username, password).await? {
            tracing::info!("Created admin account '{}'", username);
        }
    }

    spawn_expiry_sweep(
        state.appointments.clone(),
        Duration::from_secs(config.appointment_sweep_interval_secs),
    );

    let app = create_router(state, config.login_rate_limit);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("EV Dealer API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
