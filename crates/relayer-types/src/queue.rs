//! Transaction queue types.
//!
//! Queue entries are transaction intents that the queue engine submits one
//! at a time. The engine owns every status transition except the explicit
//! operator operations (retry, cancel, remove).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a queued transaction.
///
/// Valid transitions:
/// `Pending -> Processing -> Completed | Failed`,
/// `Pending -> Cancelled`, `Failed -> Pending` (explicit retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
	Pending,
	Processing,
	Completed,
	Failed,
	Cancelled,
}

impl TransactionStatus {
	/// Returns true for statuses that `clear_completed` prunes.
	pub fn is_finished(&self) -> bool {
		matches!(
			self,
			TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Cancelled
		)
	}
}

impl fmt::Display for TransactionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			TransactionStatus::Pending => "pending",
			TransactionStatus::Processing => "processing",
			TransactionStatus::Completed => "completed",
			TransactionStatus::Failed => "failed",
			TransactionStatus::Cancelled => "cancelled",
		};
		f.write_str(s)
	}
}

/// Caller-supplied fields of a transaction to enqueue.
///
/// The engine does not interpret any of these; `value` is a decimal wei
/// amount and `data` an optional hex payload by convention of the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
	pub to: String,
	pub value: String,
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// A transaction held in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTransaction {
	/// Generated at enqueue time, never changes.
	pub id: String,
	pub to: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
	pub description: String,
	pub status: TransactionStatus,
	/// Set once the submission succeeded.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hash: Option<String>,
	/// Set only while the entry is failed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(rename = "retryCount")]
	pub retry_count: u32,
	/// Creation time in UNIX milliseconds.
	pub timestamp: u64,
}

impl QueuedTransaction {
	/// Creates a pending entry from an intent.
	pub fn new(id: String, intent: TransactionIntent, timestamp: u64) -> Self {
		Self {
			id,
			to: intent.to,
			value: intent.value,
			data: intent.data,
			description: intent.description,
			status: TransactionStatus::Pending,
			hash: None,
			error: None,
			retry_count: 0,
			timestamp,
		}
	}
}

/// Snapshot of the queue drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRunState {
	#[serde(rename = "isProcessing")]
	pub is_processing: bool,
	#[serde(rename = "isPaused")]
	pub is_paused: bool,
	/// Index into the pending snapshot of the running pass, -1 when idle.
	#[serde(rename = "currentIndex")]
	pub current_index: i64,
	pub completed: u32,
	pub failed: u32,
}

impl Default for QueueRunState {
	fn default() -> Self {
		Self {
			is_processing: false,
			is_paused: false,
			current_index: -1,
			completed: 0,
			failed: 0,
		}
	}
}
