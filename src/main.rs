use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use meesho_extractor::{
    config::Config,
    api::routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meesho_extractor=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let server_addr = config.server_addr;
    tracing::info!(
        site = %config.site.domain,
        fetch_timeout = ?config.fetch_timeout,
        "configuration loaded"
    );

    let app_state = AppState::new(config)?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;

    tracing::info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
