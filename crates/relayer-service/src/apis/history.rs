//! Transaction history endpoints.

use axum::{
	extract::{Path, State},
	response::Json,
};
use relayer_storage::StorageError;
use relayer_types::{APIError, HistoryRecord, UpdateHistoryStatusRequest};

use crate::server::AppState;

fn storage_error(e: StorageError) -> APIError {
	match e {
		StorageError::NotFound => APIError::not_found("History record not found"),
		other => {
			tracing::warn!(error = %other, "History storage failed");
			APIError::internal(other.to_string())
		},
	}
}

/// GET /api/history
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<HistoryRecord>>, APIError> {
	let records = state.relayer.history().list().await.map_err(storage_error)?;
	Ok(Json(records))
}

/// GET /api/history/{hash}
pub async fn get(
	State(state): State<AppState>,
	Path(hash): Path<String>,
) -> Result<Json<HistoryRecord>, APIError> {
	state
		.relayer
		.history()
		.get(&hash)
		.await
		.map_err(storage_error)?
		.map(Json)
		.ok_or_else(|| APIError::not_found(format!("No history record for {}", hash)))
}

/// PUT /api/history/{hash}/status
pub async fn update_status(
	State(state): State<AppState>,
	Path(hash): Path<String>,
	Json(request): Json<UpdateHistoryStatusRequest>,
) -> Result<Json<HistoryRecord>, APIError> {
	let record = state
		.relayer
		.history()
		.update_status(&hash, request.status)
		.await
		.map_err(storage_error)?;
	Ok(Json(record))
}
