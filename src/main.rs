//! JAC BOT proxy server
//!
//! Forwards session and question requests to the answering backend and
//! serves the documents that answers cite.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jacbot::backend::BackendClient;
use jacbot::config::Config;
use jacbot::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jacbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    if !config.pdf_dir.is_dir() {
        tracing::warn!(
            "PDF directory {} does not exist, citation links will 404",
            config.pdf_dir.display()
        );
    }

    let state = AppState {
        backend: Arc::new(BackendClient::new(config.backend_base_url.clone())),
    };

    let app = Router::new()
        .merge(routes::router(&config.pdf_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Proxying {} at http://{}", config.backend_base_url, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
