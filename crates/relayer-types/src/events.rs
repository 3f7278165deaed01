//! Event types published by the queue engine.
//!
//! Every state-relevant change is published on the event bus as a
//! `QueueEvent`. Consumers (UI bridges, the service log task) decide how to
//! present them; the engine never depends on presentation.

use serde::{Deserialize, Serialize};

/// Kind of a queue notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEventKind {
	/// A transaction was appended to the queue.
	Enqueued,
	/// A drain pass started.
	PassStarted,
	/// A drain pass stopped early because of a pause request.
	PassPaused,
	/// The queue was resumed after a pause.
	PassResumed,
	/// A drain pass went through its whole snapshot.
	PassCompleted,
	/// A transaction was submitted and received a hash.
	TransactionSubmitted,
	/// A transaction submission failed.
	TransactionFailed,
	/// A failed transaction was returned to pending.
	RetryQueued,
	/// A pending transaction was cancelled.
	Cancelled,
	/// A transaction was removed from the queue.
	Removed,
	/// Finished or all transactions were cleared.
	Cleared,
	/// A retry was refused because the budget is spent.
	MaxRetriesReached,
	/// A queue mutation was refused in the current state.
	OperationRefused,
}

/// Structured notification emitted by the queue engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
	pub kind: QueueEventKind,
	#[serde(
		rename = "transactionId",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub transaction_id: Option<String>,
	pub message: String,
}

impl QueueEvent {
	pub fn new(kind: QueueEventKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			transaction_id: None,
			message: message.into(),
		}
	}

	pub fn for_transaction(
		kind: QueueEventKind,
		transaction_id: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			kind,
			transaction_id: Some(transaction_id.into()),
			message: message.into(),
		}
	}

	/// True for events that report a problem to the operator.
	pub fn is_error(&self) -> bool {
		matches!(
			self.kind,
			QueueEventKind::TransactionFailed
				| QueueEventKind::MaxRetriesReached
				| QueueEventKind::OperationRefused
		)
	}
}
