//! Transaction history store.
//!
//! Records are stored under `history:{hash}`; the submission order lives in
//! a single index entry under `history_index:all`.

use crate::{StorageError, StorageService};
use relayer_types::{current_timestamp_millis, HistoryRecord, HistoryStatus, StorageKey};
use std::sync::Arc;
use tokio::sync::Mutex;

const INDEX_ID: &str = "all";

/// Persistent record of submitted transactions.
pub struct TransactionHistory {
	storage: Arc<StorageService>,
	/// Serializes read-modify-write cycles on the index.
	index_lock: Mutex<()>,
}

impl TransactionHistory {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			index_lock: Mutex::new(()),
		}
	}

	/// Saves a record. Saving the same hash twice replaces the record and
	/// keeps its original position.
	pub async fn save(&self, record: &HistoryRecord) -> Result<(), StorageError> {
		let _guard = self.index_lock.lock().await;
		self.storage
			.store(StorageKey::History, &record.hash, record)
			.await?;

		let mut index = self.index().await?;
		if !index.contains(&record.hash) {
			index.push(record.hash.clone());
			self.storage
				.store(StorageKey::HistoryIndex, INDEX_ID, &index)
				.await?;
		}
		tracing::debug!(hash = %record.hash, "Saved history record");
		Ok(())
	}

	pub async fn get(&self, hash: &str) -> Result<Option<HistoryRecord>, StorageError> {
		self.storage
			.retrieve_optional(StorageKey::History, hash)
			.await
	}

	/// Updates the status of the record with `hash`.
	pub async fn update_status(
		&self,
		hash: &str,
		status: HistoryStatus,
	) -> Result<HistoryRecord, StorageError> {
		let mut record: HistoryRecord = self.storage.retrieve(StorageKey::History, hash).await?;
		record.status = status;
		record.updated_at = current_timestamp_millis();
		self.storage
			.update(StorageKey::History, hash, &record)
			.await?;
		Ok(record)
	}

	/// Lists records in submission order.
	///
	/// Hashes whose record expired or was removed are skipped.
	pub async fn list(&self) -> Result<Vec<HistoryRecord>, StorageError> {
		let index = self.index().await?;
		let mut records = Vec::with_capacity(index.len());
		for hash in &index {
			if let Some(record) = self.get(hash).await? {
				records.push(record);
			}
		}
		Ok(records)
	}

	async fn index(&self) -> Result<Vec<String>, StorageError> {
		Ok(self
			.storage
			.retrieve_optional(StorageKey::HistoryIndex, INDEX_ID)
			.await?
			.unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;

	fn record(hash: &str, queue_id: &str) -> HistoryRecord {
		HistoryRecord {
			hash: hash.to_string(),
			queue_id: queue_id.to_string(),
			chain_id: 31337,
			to: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
			value: "1000".to_string(),
			description: "payout".to_string(),
			status: HistoryStatus::Submitted,
			timestamp: 1,
			updated_at: 1,
		}
	}

	fn history() -> TransactionHistory {
		TransactionHistory::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	#[tokio::test]
	async fn test_list_keeps_submission_order() {
		let history = history();
		history.save(&record("0x02", "tx-a")).await.unwrap();
		history.save(&record("0x01", "tx-b")).await.unwrap();
		history.save(&record("0x02", "tx-a")).await.unwrap();

		let hashes: Vec<_> = history
			.list()
			.await
			.unwrap()
			.into_iter()
			.map(|r| r.hash)
			.collect();
		assert_eq!(hashes, vec!["0x02", "0x01"]);
	}

	#[tokio::test]
	async fn test_update_status_by_hash() {
		let history = history();
		history.save(&record("0xaa", "tx-a")).await.unwrap();

		let updated = history
			.update_status("0xaa", HistoryStatus::Confirmed)
			.await
			.unwrap();
		assert_eq!(updated.status, HistoryStatus::Confirmed);
		assert!(updated.updated_at >= updated.timestamp);

		let stored = history.get("0xaa").await.unwrap().unwrap();
		assert_eq!(stored.status, HistoryStatus::Confirmed);
	}

	#[tokio::test]
	async fn test_unknown_hash() {
		let history = history();
		assert!(history.get("0xnone").await.unwrap().is_none());
		assert!(matches!(
			history.update_status("0xnone", HistoryStatus::Failed).await,
			Err(StorageError::NotFound)
		));
		assert!(history.list().await.unwrap().is_empty());
	}
}
