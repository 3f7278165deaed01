//! Sequential transaction queue.
//!
//! The engine drains pending entries one at a time through an injected
//! `TransactionSubmitter`. Operators can pause, resume, retry, cancel and
//! remove entries; every change is published on the event bus.

use crate::engine::event_bus::EventBus;
use relayer_provider::TransactionSubmitter;
use relayer_storage::TransactionHistory;
use relayer_types::{
	current_timestamp_millis, generate_transaction_id, truncate_id, HistoryRecord, HistoryStatus,
	QueueEvent, QueueEventKind, QueueRunState, QueuedTransaction, TransactionIntent,
	TransactionStatus,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::instrument;

pub mod store;

pub use store::QueueStore;

/// Explicit retries allowed per entry unless configured otherwise.
pub const MAX_RETRY_ATTEMPTS: u32 = 2;

/// Pause between two submissions of one pass unless configured otherwise.
pub const DEFAULT_INTER_TRANSACTION_DELAY: Duration = Duration::from_secs(1);

/// Errors returned by queue operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
	/// The operation is not allowed in the current state.
	#[error("Cannot {operation}: {reason}")]
	Refused {
		operation: &'static str,
		reason: String,
	},
	#[error("Transaction {0} not found")]
	NotFound(String),
}

/// Tunables of the queue engine.
#[derive(Debug, Clone)]
pub struct QueueSettings {
	/// Chain recorded in history entries.
	pub chain_id: u64,
	/// Wait after each submission before the next one. Zero disables it.
	pub inter_transaction_delay: Duration,
	pub max_retry_attempts: u32,
}

impl Default for QueueSettings {
	fn default() -> Self {
		Self {
			chain_id: 0,
			inter_transaction_delay: DEFAULT_INTER_TRANSACTION_DELAY,
			max_retry_attempts: MAX_RETRY_ATTEMPTS,
		}
	}
}

#[derive(Debug, Clone, Copy)]
struct PassCounters {
	current_index: i64,
	completed: u32,
	failed: u32,
}

impl Default for PassCounters {
	fn default() -> Self {
		Self {
			current_index: -1,
			completed: 0,
			failed: 0,
		}
	}
}

/// Drains the queue sequentially and applies operator commands.
pub struct TransactionQueueEngine {
	store: RwLock<QueueStore>,
	counters: RwLock<PassCounters>,
	/// Set while a pass runs. Claimed with compare-and-set before any await.
	processing: AtomicBool,
	paused: AtomicBool,
	submitter: Arc<dyn TransactionSubmitter>,
	event_bus: EventBus,
	history: Option<Arc<TransactionHistory>>,
	settings: QueueSettings,
}

impl TransactionQueueEngine {
	pub fn new(
		submitter: Arc<dyn TransactionSubmitter>,
		event_bus: EventBus,
		settings: QueueSettings,
	) -> Self {
		Self {
			store: RwLock::new(QueueStore::new()),
			counters: RwLock::new(PassCounters::default()),
			processing: AtomicBool::new(false),
			paused: AtomicBool::new(false),
			submitter,
			event_bus,
			history: None,
			settings,
		}
	}

	/// Records every successful submission in `history`.
	pub fn with_history(mut self, history: Arc<TransactionHistory>) -> Self {
		self.history = Some(history);
		self
	}

	pub fn settings(&self) -> &QueueSettings {
		&self.settings
	}

	/// Appends a pending entry and returns its id.
	pub async fn enqueue(&self, intent: TransactionIntent) -> String {
		let now = current_timestamp_millis();
		let id = generate_transaction_id(now);
		let description = intent.description.clone();
		self.store
			.write()
			.await
			.push(QueuedTransaction::new(id.clone(), intent, now));

		tracing::info!(tx_id = %truncate_id(&id), "Transaction queued");
		self.publish(QueueEvent::for_transaction(
			QueueEventKind::Enqueued,
			&id,
			format!("Queued: {}", description),
		));
		id
	}

	/// Runs one drain pass over the entries pending right now.
	///
	/// Returns immediately if a pass is already running. Entries cancelled or
	/// removed after the pass started are skipped. A failed submission is
	/// recorded and the pass moves on.
	#[instrument(skip_all)]
	pub async fn process_queue(&self) {
		if self
			.processing
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			tracing::debug!("Drain pass already running");
			return;
		}
		self.paused.store(false, Ordering::SeqCst);

		let snapshot = self.store.read().await.pending_ids();
		*self.counters.write().await = PassCounters {
			current_index: 0,
			..Default::default()
		};
		tracing::info!(pending = snapshot.len(), "Drain pass started");
		self.publish(QueueEvent::new(
			QueueEventKind::PassStarted,
			format!("Processing {} transactions", snapshot.len()),
		));

		let mut interrupted = false;
		for (index, id) in snapshot.iter().enumerate() {
			if self.paused.load(Ordering::SeqCst) {
				interrupted = true;
				break;
			}
			self.counters.write().await.current_index = index as i64;

			let Some(tx) = self.claim(id).await else {
				tracing::debug!(tx_id = %truncate_id(id), "Skipping entry that is no longer pending");
				continue;
			};

			let outcome = self.submitter.submit(&tx).await;
			self.record_outcome(&tx, outcome.map_err(|e| e.message().to_string()))
				.await;

			let is_last = index + 1 == snapshot.len();
			if !is_last && !self.settings.inter_transaction_delay.is_zero() {
				tokio::time::sleep(self.settings.inter_transaction_delay).await;
			}
		}

		let counters = {
			let mut counters = self.counters.write().await;
			counters.current_index = -1;
			*counters
		};
		if !interrupted {
			// a pause that arrived during the last entry has nothing left to stop
			self.paused.store(false, Ordering::SeqCst);
		}
		self.processing.store(false, Ordering::SeqCst);

		if interrupted {
			tracing::info!(completed = counters.completed, failed = counters.failed, "Drain pass paused");
			self.publish(QueueEvent::new(
				QueueEventKind::PassPaused,
				"Queue paused",
			));
		} else {
			tracing::info!(completed = counters.completed, failed = counters.failed, "Drain pass finished");
			self.publish(QueueEvent::new(
				QueueEventKind::PassCompleted,
				format!(
					"Queue complete: {} succeeded, {} failed",
					counters.completed, counters.failed
				),
			));
		}
	}

	/// Starts a drain pass on a background task.
	pub fn spawn_processing(self: &Arc<Self>) -> JoinHandle<()> {
		let engine = Arc::clone(self);
		tokio::spawn(async move { engine.process_queue().await })
	}

	/// Asks the running pass to stop after the current entry.
	pub async fn pause(&self) -> Result<(), QueueError> {
		if !self.processing.load(Ordering::SeqCst) {
			return Err(self.refuse("pause", None, "no pass is running"));
		}
		self.paused.store(true, Ordering::SeqCst);
		tracing::info!("Pause requested");
		Ok(())
	}

	/// Clears the pause flag and runs a new pass over the remaining entries.
	///
	/// `PassResumed` is published only when a pause was cleared or no pass is
	/// running yet.
	pub async fn resume(&self) {
		let was_paused = self.paused.swap(false, Ordering::SeqCst);
		if was_paused || !self.is_processing() {
			self.publish(QueueEvent::new(QueueEventKind::PassResumed, "Queue resumed"));
		}
		self.process_queue().await;
	}

	/// `resume` on a background task.
	pub fn spawn_resume(self: &Arc<Self>) -> JoinHandle<()> {
		let engine = Arc::clone(self);
		tokio::spawn(async move { engine.resume().await })
	}

	/// Returns a failed entry to pending, within the retry budget.
	///
	/// Does not start a pass.
	pub async fn retry(&self, id: &str) -> Result<(), QueueError> {
		let mut store = self.store.write().await;
		let tx = store
			.get_mut(id)
			.ok_or_else(|| QueueError::NotFound(id.to_string()))?;

		if tx.status != TransactionStatus::Failed {
			let reason = format!("transaction is {}", tx.status);
			drop(store);
			return Err(self.refuse("retry", Some(id), reason));
		}
		if tx.retry_count >= self.settings.max_retry_attempts {
			drop(store);
			self.publish(QueueEvent::for_transaction(
				QueueEventKind::MaxRetriesReached,
				id,
				"Max retries reached",
			));
			return Err(QueueError::Refused {
				operation: "retry",
				reason: "max retries reached".to_string(),
			});
		}

		tx.status = TransactionStatus::Pending;
		tx.error = None;
		tx.retry_count += 1;
		let attempt = tx.retry_count;
		drop(store);

		tracing::info!(tx_id = %truncate_id(id), attempt, "Transaction queued for retry");
		self.publish(QueueEvent::for_transaction(
			QueueEventKind::RetryQueued,
			id,
			format!("Retry {} queued", attempt),
		));
		Ok(())
	}

	/// Cancels a pending entry.
	pub async fn cancel(&self, id: &str) -> Result<(), QueueError> {
		let mut store = self.store.write().await;
		let tx = store
			.get_mut(id)
			.ok_or_else(|| QueueError::NotFound(id.to_string()))?;

		if tx.status != TransactionStatus::Pending {
			let reason = format!("transaction is {}", tx.status);
			drop(store);
			return Err(self.refuse("cancel", Some(id), reason));
		}
		tx.status = TransactionStatus::Cancelled;
		drop(store);

		self.publish(QueueEvent::for_transaction(
			QueueEventKind::Cancelled,
			id,
			"Transaction cancelled",
		));
		Ok(())
	}

	/// Removes an entry. Refused while it is processing or a pass runs.
	pub async fn remove(&self, id: &str) -> Result<(), QueueError> {
		if self.processing.load(Ordering::SeqCst) {
			return Err(self.refuse("remove", Some(id), "queue is processing"));
		}
		let mut store = self.store.write().await;
		match store.get(id).map(|tx| tx.status) {
			None => return Err(QueueError::NotFound(id.to_string())),
			Some(TransactionStatus::Processing) => {
				drop(store);
				return Err(self.refuse("remove", Some(id), "transaction is processing"));
			},
			Some(_) => {
				store.remove(id);
			},
		}
		drop(store);

		self.publish(QueueEvent::for_transaction(
			QueueEventKind::Removed,
			id,
			"Transaction removed",
		));
		Ok(())
	}

	/// Drops completed, failed and cancelled entries.
	pub async fn clear_completed(&self) -> usize {
		let removed = self.store.write().await.retain_unfinished();
		self.publish(QueueEvent::new(
			QueueEventKind::Cleared,
			format!("Cleared {} finished transactions", removed),
		));
		removed
	}

	/// Empties the queue. Refused while a pass runs.
	pub async fn clear_all(&self) -> Result<usize, QueueError> {
		if self.processing.load(Ordering::SeqCst) {
			return Err(self.refuse("clear the queue", None, "queue is processing"));
		}
		let removed = self.store.write().await.clear();
		self.publish(QueueEvent::new(
			QueueEventKind::Cleared,
			format!("Cleared {} transactions", removed),
		));
		Ok(removed)
	}

	pub async fn transactions(&self) -> Vec<QueuedTransaction> {
		self.store.read().await.snapshot()
	}

	pub async fn get(&self, id: &str) -> Option<QueuedTransaction> {
		self.store.read().await.get(id).cloned()
	}

	pub async fn state(&self) -> QueueRunState {
		let counters = *self.counters.read().await;
		QueueRunState {
			is_processing: self.is_processing(),
			is_paused: self.is_paused(),
			current_index: counters.current_index,
			completed: counters.completed,
			failed: counters.failed,
		}
	}

	pub fn is_processing(&self) -> bool {
		self.processing.load(Ordering::SeqCst)
	}

	pub fn is_paused(&self) -> bool {
		self.paused.load(Ordering::SeqCst)
	}

	/// Moves a still-pending entry to processing and returns a copy of it.
	async fn claim(&self, id: &str) -> Option<QueuedTransaction> {
		let mut store = self.store.write().await;
		let tx = store.get_mut(id)?;
		if tx.status != TransactionStatus::Pending {
			return None;
		}
		tx.status = TransactionStatus::Processing;
		Some(tx.clone())
	}

	async fn record_outcome(&self, tx: &QueuedTransaction, outcome: Result<String, String>) {
		{
			let mut store = self.store.write().await;
			if let Some(entry) = store.get_mut(&tx.id) {
				match &outcome {
					Ok(hash) => {
						entry.status = TransactionStatus::Completed;
						entry.hash = Some(hash.clone());
						entry.error = None;
					},
					Err(message) => {
						entry.status = TransactionStatus::Failed;
						entry.error = Some(message.clone());
					},
				}
			}
		}
		{
			let mut counters = self.counters.write().await;
			match outcome {
				Ok(_) => counters.completed += 1,
				Err(_) => counters.failed += 1,
			}
		}

		match outcome {
			Ok(hash) => {
				tracing::info!(tx_id = %truncate_id(&tx.id), hash = %hash, "Transaction submitted");
				self.publish(QueueEvent::for_transaction(
					QueueEventKind::TransactionSubmitted,
					&tx.id,
					format!("{}: {}", tx.description, hash),
				));
				self.save_history(tx, hash).await;
			},
			Err(message) => {
				tracing::warn!(tx_id = %truncate_id(&tx.id), error = %message, "Transaction failed");
				self.publish(QueueEvent::for_transaction(
					QueueEventKind::TransactionFailed,
					&tx.id,
					format!("{}: {}", tx.description, message),
				));
			},
		}
	}

	async fn save_history(&self, tx: &QueuedTransaction, hash: String) {
		let Some(history) = &self.history else {
			return;
		};
		let now = current_timestamp_millis();
		let record = HistoryRecord {
			hash,
			queue_id: tx.id.clone(),
			chain_id: self.settings.chain_id,
			to: tx.to.clone(),
			value: tx.value.clone(),
			description: tx.description.clone(),
			status: HistoryStatus::Submitted,
			timestamp: now,
			updated_at: now,
		};
		if let Err(e) = history.save(&record).await {
			tracing::warn!(tx_id = %truncate_id(&tx.id), error = %e, "Failed to save history record");
		}
	}

	fn refuse(
		&self,
		operation: &'static str,
		id: Option<&str>,
		reason: impl Into<String>,
	) -> QueueError {
		let reason = reason.into();
		let message = format!("Cannot {}: {}", operation, reason);
		tracing::debug!(operation, reason = %reason, "Queue operation refused");
		let event = match id {
			Some(id) => QueueEvent::for_transaction(QueueEventKind::OperationRefused, id, message),
			None => QueueEvent::new(QueueEventKind::OperationRefused, message),
		};
		self.publish(event);
		QueueError::Refused { operation, reason }
	}

	fn publish(&self, event: QueueEvent) {
		self.event_bus.publish(event).ok();
	}
}

#[cfg(test)]
mod tests;
