//! One-shot batch mode.
//!
//! Enqueues every intent of a JSON file, drains the queue once and prints
//! the provider statistics and the final queue.

use relayer_core::RelayerEngine;
use relayer_types::{ProviderStats, QueueResponse, TransactionIntent};
use serde::Serialize;
use std::path::Path;

/// Printed to stdout when the batch finishes.
#[derive(Debug, Serialize)]
pub struct BatchReport {
	pub chain_id: u64,
	pub providers: Vec<ProviderStats>,
	pub queue: QueueResponse,
}

/// Reads a JSON array of `{to, value, description, data?}` objects.
pub async fn load_intents(path: &Path) -> Result<Vec<TransactionIntent>, Box<dyn std::error::Error>> {
	let contents = tokio::fs::read_to_string(path).await?;
	let intents: Vec<TransactionIntent> = serde_json::from_str(&contents)?;
	Ok(intents)
}

pub async fn run_batch(
	relayer: &RelayerEngine,
	intents: Vec<TransactionIntent>,
) -> Result<BatchReport, Box<dyn std::error::Error>> {
	let queue = relayer.queue();
	for intent in intents {
		queue.enqueue(intent).await;
	}
	queue.process_queue().await;

	let chain_id = queue.settings().chain_id;
	Ok(BatchReport {
		chain_id,
		providers: relayer.provider_stats(chain_id)?,
		queue: QueueResponse {
			transactions: queue.transactions().await,
			state: queue.state().await,
		},
	})
}
