//! API types for the relayer HTTP API.
//!
//! Request and response bodies for the queue, provider and history endpoints,
//! plus the structured error type every handler returns.

use crate::{HistoryStatus, QueueRunState, QueuedTransaction, TransactionIntent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/queue`.
pub type EnqueueRequest = TransactionIntent;

/// Response for a newly enqueued transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
	pub id: String,
}

/// Queue contents together with the run state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
	pub transactions: Vec<QueuedTransaction>,
	pub state: QueueRunState,
}

/// Response for `GET /api/providers/{chain_id}/active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveProviderResponse {
	pub chain_id: u64,
	pub url: String,
}

/// Body of `PUT /api/history/{hash}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHistoryStatusRequest {
	pub status: HistoryStatus,
}

/// Acknowledgement for queue commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
	pub message: String,
}

impl CommandResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request (400)
	BadRequest { error_type: String, message: String },
	/// Unknown transaction, network or history record (404)
	NotFound { error_type: String, message: String },
	/// Operation refused in the current queue state (409)
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Required component is disabled (503)
	ServiceUnavailable { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::BadRequest {
			error_type: "INVALID_REQUEST".to_string(),
			message: message.into(),
		}
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound {
			error_type: "NOT_FOUND".to_string(),
			message: message.into(),
		}
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: message.into(),
		}
	}

	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::Conflict {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::ServiceUnavailable {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
