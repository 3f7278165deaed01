//! Relayer engine that owns the queue and the provider managers.
//!
//! The engine is the handle every outer surface works with: the HTTP API and
//! the batch runner reach the queue, the history and the per-network
//! managers through it. `run` hosts the background tasks until shutdown.

pub mod event_bus;

use crate::queue::TransactionQueueEngine;
use relayer_config::Config;
use relayer_provider::{ProviderHealthTracker, RpcProviderManager};
use relayer_storage::{StorageService, TransactionHistory};
use relayer_types::{truncate_id, ProviderStats, QueueEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("No provider manager for chain {0}")]
	UnknownNetwork(u64),
}

/// Main relayer engine.
#[derive(Clone)]
pub struct RelayerEngine {
	pub(crate) config: Config,
	pub(crate) storage: Arc<StorageService>,
	/// Health cache shared by all managers.
	pub(crate) tracker: Arc<ProviderHealthTracker>,
	pub(crate) managers: Arc<HashMap<u64, Arc<RpcProviderManager>>>,
	pub(crate) queue: Arc<TransactionQueueEngine>,
	pub(crate) history: Arc<TransactionHistory>,
	pub(crate) event_bus: event_bus::EventBus,
}

impl RelayerEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		tracker: Arc<ProviderHealthTracker>,
		managers: HashMap<u64, Arc<RpcProviderManager>>,
		queue: Arc<TransactionQueueEngine>,
		history: Arc<TransactionHistory>,
		event_bus: event_bus::EventBus,
	) -> Self {
		Self {
			config,
			storage,
			tracker,
			managers: Arc::new(managers),
			queue,
			history,
			event_bus,
		}
	}

	/// Runs the background tasks until ctrl-c.
	///
	/// A running drain pass is asked to pause so it stops after the entry in
	/// flight.
	pub async fn run(&self) -> Result<(), EngineError> {
		let cleanup_interval = self.config.storage.cleanup_interval_seconds;
		if cleanup_interval == 0 {
			return Err(EngineError::Config(
				"cleanup_interval_seconds must be positive".into(),
			));
		}

		// Start storage cleanup task
		let storage = self.storage.clone();
		let cleanup_handle = tokio::spawn(async move {
			let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));
			loop {
				interval.tick().await;
				match storage.cleanup_expired().await {
					Ok(count) if count > 0 => {
						tracing::debug!("Storage cleanup: removed {} expired entries", count);
					},
					Err(e) => {
						tracing::warn!("Storage cleanup failed: {}", e);
					},
					_ => {},
				}
			}
		});

		let logger_handle = self.spawn_event_logger();
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for shutdown signal");
		}

		cleanup_handle.abort();
		logger_handle.abort();
		if self.queue.is_processing() {
			self.queue.pause().await.ok();
		}
		Ok(())
	}

	/// Logs every queue event until the bus closes.
	pub fn spawn_event_logger(&self) -> JoinHandle<()> {
		let mut event_receiver = self.event_bus.subscribe();
		tokio::spawn(async move {
			loop {
				match event_receiver.recv().await {
					Ok(event) => log_event(&event),
					Err(RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Event log fell behind");
					},
					Err(RecvError::Closed) => break,
				}
			}
		})
	}

	pub fn event_bus(&self) -> &event_bus::EventBus {
		&self.event_bus
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn queue(&self) -> &Arc<TransactionQueueEngine> {
		&self.queue
	}

	pub fn history(&self) -> &Arc<TransactionHistory> {
		&self.history
	}

	pub fn tracker(&self) -> &Arc<ProviderHealthTracker> {
		&self.tracker
	}

	/// Returns the provider manager of a configured network.
	pub fn manager(&self, chain_id: u64) -> Result<&Arc<RpcProviderManager>, EngineError> {
		self.managers
			.get(&chain_id)
			.ok_or(EngineError::UnknownNetwork(chain_id))
	}

	/// Configured chain ids in ascending order.
	pub fn chain_ids(&self) -> Vec<u64> {
		let mut ids: Vec<u64> = self.managers.keys().copied().collect();
		ids.sort_unstable();
		ids
	}

	pub fn provider_stats(&self, chain_id: u64) -> Result<Vec<ProviderStats>, EngineError> {
		Ok(self.manager(chain_id)?.get_provider_stats())
	}
}

fn log_event(event: &QueueEvent) {
	let tx_id = event.transaction_id.as_deref().map(truncate_id);
	if event.is_error() {
		tracing::warn!(kind = ?event.kind, tx_id = ?tx_id, "{}", event.message);
	} else {
		tracing::info!(kind = ?event.kind, tx_id = ?tx_id, "{}", event.message);
	}
}
