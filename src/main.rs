use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stir::{app, config::Config, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Refusing to start: {:#}", e);
            return Err(e);
        }
    };
    tracing::info!("✅ Configuration loaded successfully");

    if config.session_secret.is_fallback() {
        tracing::warn!("⚠️ Session tokens are forgeable by anyone who knows the development fallback secret");
    }

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let app = app::router(state);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
