use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use crate::config::GraphConfig;

pub mod routes;

/// Server state
pub struct AppState {
    pub config: GraphConfig,
}

pub fn router(config: GraphConfig) -> Router {
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/graphql", get(routes::get_graphql).post(routes::post_graphql))
        .with_state(state)
}

pub async fn start_server(port: u16, config: GraphConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Serving entities from {} and blobs from {}",
        config.entity_store.display(),
        config.blob_store.display()
    );
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
