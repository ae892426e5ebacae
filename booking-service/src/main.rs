mod service;

use std::sync::Arc;

use booking_flow::{
    BookingConfig, BookingServices, FileSettingsStore, InMemorySessionStorage, SessionStorage,
    ThemeSettings,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::service::{AppState, build_router};

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "booking_service=debug,booking_flow=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = BookingConfig::from_env()?;
    info!(
        window_days = config.availability.window_days,
        reset_grace_ms = config.reset_grace_ms,
        "Booking configuration loaded"
    );

    let theme_file = std::env::var("THEME_FILE").unwrap_or_else(|_| "theme.json".to_string());
    let theme = ThemeSettings::init(
        Arc::new(FileSettingsStore::new(theme_file)),
        env_flag("PREFERS_DARK"),
    );

    let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let app_state = AppState {
        session_storage,
        services: BookingServices::with_mocks(config),
        theme: Arc::new(theme),
    };

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Booking service running on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(app_state)).await?;

    Ok(())
}
