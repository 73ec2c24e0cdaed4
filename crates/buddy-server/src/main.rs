mod configuration;
mod error;
mod markdown;
mod routes;
mod state;

use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine, the environment may already be set
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = configuration::Settings::new()?;
    let state = state::AppState::from_settings(&settings)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let addr = settings.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);

    if settings.server.open_browser {
        let url = format!("http://{}", addr);
        if let Err(e) = webbrowser::open(&url) {
            tracing::warn!("Could not open {} in a browser: {}", url, e);
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
