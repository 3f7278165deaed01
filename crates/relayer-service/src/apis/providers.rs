//! Provider diagnostics endpoints.

use axum::{
	extract::{Path, State},
	response::Json,
};
use relayer_core::EngineError;
use relayer_types::{ActiveProviderResponse, APIError, ProviderStats};

use crate::server::AppState;

fn unknown_network(e: EngineError) -> APIError {
	APIError::not_found(e.to_string())
}

/// GET /api/providers/{chain_id}
pub async fn stats(
	State(state): State<AppState>,
	Path(chain_id): Path<u64>,
) -> Result<Json<Vec<ProviderStats>>, APIError> {
	let stats = state
		.relayer
		.provider_stats(chain_id)
		.map_err(unknown_network)?;
	Ok(Json(stats))
}

/// GET /api/providers/{chain_id}/active
///
/// May probe providers whose cached health expired.
pub async fn active(
	State(state): State<AppState>,
	Path(chain_id): Path<u64>,
) -> Result<Json<ActiveProviderResponse>, APIError> {
	let manager = state.relayer.manager(chain_id).map_err(unknown_network)?;
	let url = manager.get_active_provider().await.map_err(|e| {
		tracing::warn!(chain_id, error = %e, "No active provider");
		APIError::ServiceUnavailable {
			error_type: "NO_PROVIDER".to_string(),
			message: e.to_string(),
		}
	})?;
	Ok(Json(ActiveProviderResponse { chain_id, url }))
}
