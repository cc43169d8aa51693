//! The HTTP surface: four read-only JSON views and a banner route. Thin
//! wiring only; everything interesting happens in [`crate::views`].

mod server;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use storeview_indexer_client::LogSource;

use crate::config::Config;

/// State shared by every request handler. Requests share nothing mutable;
/// each one performs its own fetch.
pub struct ApiContext {
    pub config: Config,
    pub source: Arc<dyn LogSource>,
}

/// Builds the service router.
pub fn router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(server::index))
        .route("/materials", get(server::materials))
        .route("/recipes", get(server::recipes))
        .route("/orders", get(server::orders))
        .route("/pods/:address", get(server::pod_topology))
        .with_state(Arc::new(ctx))
}
