//! HTTP server for the relayer API.
//!
//! Exposes the queue commands, provider diagnostics and the transaction
//! history under `/api`.

use axum::{
	extract::DefaultBodyLimit,
	routing::{get, post, put},
	Router,
};
use relayer_config::ApiConfig;
use relayer_core::RelayerEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::apis::{history, providers, queue};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub relayer: Arc<RelayerEngine>,
}

/// Builds the `/api` router.
pub fn router(relayer: Arc<RelayerEngine>, api_config: &ApiConfig) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/providers/{chain_id}", get(providers::stats))
				.route("/providers/{chain_id}/active", get(providers::active))
				.route(
					"/queue",
					get(queue::list).post(queue::enqueue).delete(queue::clear_all),
				)
				.route("/queue/process", post(queue::process))
				.route("/queue/pause", post(queue::pause))
				.route("/queue/resume", post(queue::resume))
				.route("/queue/clear-completed", post(queue::clear_completed))
				.route("/queue/{id}", axum::routing::delete(queue::remove))
				.route("/queue/{id}/retry", post(queue::retry))
				.route("/queue/{id}/cancel", post(queue::cancel))
				.route("/history", get(history::list))
				.route("/history/{hash}", get(history::get))
				.route("/history/{hash}/status", put(history::update_status)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(CorsLayer::permissive())
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(AppState { relayer })
}

/// Binds the configured address and serves the API until the task is dropped.
pub async fn start_server(
	api_config: ApiConfig,
	relayer: Arc<RelayerEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(relayer, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Relayer API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
