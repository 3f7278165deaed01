//! Ordered in-memory collection of queued transactions.

use relayer_types::{QueuedTransaction, TransactionStatus};

/// Queue entries in insertion order.
#[derive(Debug, Default)]
pub struct QueueStore {
	entries: Vec<QueuedTransaction>,
}

impl QueueStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, tx: QueuedTransaction) {
		self.entries.push(tx);
	}

	pub fn get(&self, id: &str) -> Option<&QueuedTransaction> {
		self.entries.iter().find(|tx| tx.id == id)
	}

	pub fn get_mut(&mut self, id: &str) -> Option<&mut QueuedTransaction> {
		self.entries.iter_mut().find(|tx| tx.id == id)
	}

	pub fn remove(&mut self, id: &str) -> Option<QueuedTransaction> {
		let index = self.entries.iter().position(|tx| tx.id == id)?;
		Some(self.entries.remove(index))
	}

	/// Ids of pending entries, in queue order.
	pub fn pending_ids(&self) -> Vec<String> {
		self.entries
			.iter()
			.filter(|tx| tx.status == TransactionStatus::Pending)
			.map(|tx| tx.id.clone())
			.collect()
	}

	/// Drops completed, failed and cancelled entries. Returns how many went.
	pub fn retain_unfinished(&mut self) -> usize {
		let before = self.entries.len();
		self.entries.retain(|tx| !tx.status.is_finished());
		before - self.entries.len()
	}

	pub fn clear(&mut self) -> usize {
		let removed = self.entries.len();
		self.entries.clear();
		removed
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn snapshot(&self) -> Vec<QueuedTransaction> {
		self.entries.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relayer_types::TransactionIntent;

	fn entry(id: &str, status: TransactionStatus) -> QueuedTransaction {
		let mut tx = QueuedTransaction::new(
			id.to_string(),
			TransactionIntent {
				to: "0xabc".into(),
				value: "1".into(),
				description: id.to_string(),
				data: None,
			},
			0,
		);
		tx.status = status;
		tx
	}

	#[test]
	fn test_retain_unfinished_keeps_order() {
		let mut store = QueueStore::new();
		store.push(entry("a", TransactionStatus::Completed));
		store.push(entry("b", TransactionStatus::Pending));
		store.push(entry("c", TransactionStatus::Failed));
		store.push(entry("d", TransactionStatus::Processing));
		store.push(entry("e", TransactionStatus::Cancelled));
		store.push(entry("f", TransactionStatus::Pending));

		assert_eq!(store.retain_unfinished(), 3);
		let ids: Vec<_> = store.snapshot().into_iter().map(|tx| tx.id).collect();
		assert_eq!(ids, vec!["b", "d", "f"]);
		assert_eq!(store.pending_ids(), vec!["b", "f"]);
	}

	#[test]
	fn test_remove_and_clear() {
		let mut store = QueueStore::new();
		store.push(entry("a", TransactionStatus::Pending));
		store.push(entry("b", TransactionStatus::Pending));

		assert_eq!(store.remove("a").map(|tx| tx.id), Some("a".to_string()));
		assert!(store.remove("a").is_none());
		assert_eq!(store.len(), 1);
		assert_eq!(store.clear(), 1);
		assert!(store.is_empty());
	}
}
