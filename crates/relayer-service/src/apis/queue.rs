//! Queue endpoints.
//!
//! Commands that start a drain pass (`process`, `resume`) return `202` at
//! once and run the pass in the background; progress is visible through
//! `GET /api/queue`.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use relayer_core::QueueError;
use relayer_types::{
	decimal_to_quantity, parse_address, APIError, CommandResponse, EnqueueRequest,
	EnqueueResponse, QueueResponse,
};

use crate::server::AppState;

fn queue_error(e: QueueError) -> APIError {
	match e {
		QueueError::NotFound(_) => APIError::not_found(e.to_string()),
		QueueError::Refused { operation, .. } => APIError::Conflict {
			error_type: "OPERATION_REFUSED".to_string(),
			message: e.to_string(),
			details: Some(serde_json::json!({ "operation": operation })),
		},
	}
}

/// GET /api/queue
pub async fn list(State(state): State<AppState>) -> Json<QueueResponse> {
	let queue = state.relayer.queue();
	Json(QueueResponse {
		transactions: queue.transactions().await,
		state: queue.state().await,
	})
}

/// POST /api/queue
///
/// Rejects intents the submitter could never encode.
pub async fn enqueue(
	State(state): State<AppState>,
	Json(request): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>, APIError> {
	parse_address(&request.to).map_err(APIError::bad_request)?;
	decimal_to_quantity(&request.value).map_err(APIError::bad_request)?;

	let id = state.relayer.queue().enqueue(request).await;
	Ok(Json(EnqueueResponse { id }))
}

/// POST /api/queue/process
pub async fn process(State(state): State<AppState>) -> (StatusCode, Json<CommandResponse>) {
	let queue = state.relayer.queue();
	if queue.is_processing() {
		return (
			StatusCode::ACCEPTED,
			Json(CommandResponse::new("Queue is already processing")),
		);
	}
	queue.spawn_processing();
	(
		StatusCode::ACCEPTED,
		Json(CommandResponse::new("Processing started")),
	)
}

/// POST /api/queue/pause
pub async fn pause(State(state): State<AppState>) -> Result<Json<CommandResponse>, APIError> {
	state.relayer.queue().pause().await.map_err(queue_error)?;
	Ok(Json(CommandResponse::new("Pause requested")))
}

/// POST /api/queue/resume
pub async fn resume(State(state): State<AppState>) -> (StatusCode, Json<CommandResponse>) {
	state.relayer.queue().spawn_resume();
	(StatusCode::ACCEPTED, Json(CommandResponse::new("Queue resumed")))
}

/// POST /api/queue/{id}/retry
pub async fn retry(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<CommandResponse>, APIError> {
	state.relayer.queue().retry(&id).await.map_err(queue_error)?;
	Ok(Json(CommandResponse::new("Retry queued")))
}

/// POST /api/queue/{id}/cancel
pub async fn cancel(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<CommandResponse>, APIError> {
	state.relayer.queue().cancel(&id).await.map_err(queue_error)?;
	Ok(Json(CommandResponse::new("Transaction cancelled")))
}

/// DELETE /api/queue/{id}
pub async fn remove(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<CommandResponse>, APIError> {
	state.relayer.queue().remove(&id).await.map_err(queue_error)?;
	Ok(Json(CommandResponse::new("Transaction removed")))
}

/// POST /api/queue/clear-completed
pub async fn clear_completed(State(state): State<AppState>) -> Json<CommandResponse> {
	let removed = state.relayer.queue().clear_completed().await;
	Json(CommandResponse::new(format!(
		"Cleared {} finished transactions",
		removed
	)))
}

/// DELETE /api/queue
pub async fn clear_all(State(state): State<AppState>) -> Result<Json<CommandResponse>, APIError> {
	let removed = state.relayer.queue().clear_all().await.map_err(queue_error)?;
	Ok(Json(CommandResponse::new(format!(
		"Cleared {} transactions",
		removed
	))))
}
