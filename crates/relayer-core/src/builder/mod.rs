//! Builder pattern for constructing relayer engines.
//!
//! Composes a `RelayerEngine` from the configuration: storage backends come
//! from factory functions, one provider manager is created per configured
//! network and the queue submits through the manager of `queue.chain_id`.
//! The health probe and the submitter can be replaced, which tests use to
//! run the whole engine without a node.

use crate::engine::{event_bus::EventBus, RelayerEngine};
use crate::queue::{QueueSettings, TransactionQueueEngine};
use relayer_config::Config;
use relayer_provider::{
	HealthProbe, JsonRpcClient, JsonRpcProbe, ProviderHealthTracker, RpcProviderManager,
	RpcTransactionSubmitter, TransactionSubmitter,
};
use relayer_storage::{StorageError, StorageInterface, StorageService, TransactionHistory};
use relayer_types::parse_address;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Capacity of the queue event channel.
const EVENT_BUS_CAPACITY: usize = 1000;

/// Errors that can occur during relayer engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a `RelayerEngine`, keyed by
/// implementation name.
pub struct RelayerFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing a `RelayerEngine` with pluggable implementations.
pub struct RelayerBuilder {
	config: Config,
	probe: Option<Arc<dyn HealthProbe>>,
	submitter: Option<Arc<dyn TransactionSubmitter>>,
}

impl RelayerBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			probe: None,
			submitter: None,
		}
	}

	/// Replaces the `eth_blockNumber` probe used by every manager.
	pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
		self.probe = Some(probe);
		self
	}

	/// Replaces the JSON-RPC submitter used by the queue.
	pub fn with_submitter(mut self, submitter: Arc<dyn TransactionSubmitter>) -> Self {
		self.submitter = Some(submitter);
		self
	}

	pub fn build<SF>(self, factories: RelayerFactories<SF>) -> Result<RelayerEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						storage_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.storage.primary == name;
						tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Failed to create storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create storage implementation '{}': {}",
							name, e
						)));
					},
				}
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		// One tracker shared by every network
		let tracker = Arc::new(ProviderHealthTracker::new(
			self.config.health.check_interval(),
		));
		let probe_timeout = self.config.health.probe_timeout();
		let probe = match self.probe {
			Some(probe) => probe,
			None => {
				let client = JsonRpcClient::with_timeout(probe_timeout)
					.map_err(|e| BuilderError::Config(e.to_string()))?;
				Arc::new(JsonRpcProbe::new(client))
			},
		};

		let mut managers = HashMap::new();
		for (chain_id, network) in &self.config.networks {
			let manager = RpcProviderManager::new(
				*chain_id,
				network.providers.clone(),
				tracker.clone(),
				probe.clone(),
			)
			.with_probe_timeout(probe_timeout);
			tracing::info!(
				component = "provider",
				chain_id = %chain_id,
				network = %network.name,
				providers = network.providers.len(),
				"Loaded"
			);
			managers.insert(*chain_id, Arc::new(manager));
		}

		let chain_id = self.config.queue.chain_id;
		let submitter = match self.submitter {
			Some(submitter) => submitter,
			None => {
				let manager = managers.get(&chain_id).ok_or_else(|| {
					BuilderError::MissingComponent(format!(
						"provider manager for queue chain {}",
						chain_id
					))
				})?;
				let from = parse_address(&self.config.delivery.from_address)
					.map_err(BuilderError::Config)?;
				Arc::new(
					RpcTransactionSubmitter::new(manager.clone(), JsonRpcClient::new(), from)
						.with_max_attempts(self.config.queue.fallback_max_attempts),
				)
			},
		};

		let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
		let history = Arc::new(TransactionHistory::new(storage.clone()));
		let settings = QueueSettings {
			chain_id,
			inter_transaction_delay: self.config.queue.inter_transaction_delay(),
			max_retry_attempts: self.config.queue.max_retry_attempts,
		};
		let queue = Arc::new(
			TransactionQueueEngine::new(submitter, event_bus.clone(), settings)
				.with_history(history.clone()),
		);
		tracing::info!(component = "queue", chain_id = %chain_id, "Loaded");

		Ok(RelayerEngine::new(
			self.config,
			storage,
			tracker,
			managers,
			queue,
			history,
			event_bus,
		))
	}
}
