//! Configuration builder for tests and local development.

use crate::{
	ApiConfig, Config, DeliveryConfig, HealthConfig, QueueConfig, RelayerConfig, StorageConfig,
};
use relayer_types::{NetworkConfig, ProviderConfig};
use std::collections::HashMap;

/// Fluent builder producing a `Config` that needs no file on disk.
///
/// Defaults describe a single local network (chain 31337) with one provider,
/// memory storage and no pacing delay so tests run fast.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	relayer_id: String,
	chain_id: u64,
	providers: Vec<ProviderConfig>,
	check_interval_seconds: u64,
	probe_timeout_ms: u64,
	inter_transaction_delay_ms: u64,
	max_retry_attempts: u32,
	fallback_max_attempts: u32,
	from_address: String,
	storage_primary: String,
	storage_cleanup_interval_seconds: u64,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			relayer_id: "test-relayer".to_string(),
			chain_id: 31337,
			providers: vec![ProviderConfig::new("http://localhost:8545", 0, 3)],
			check_interval_seconds: 30,
			probe_timeout_ms: 5000,
			inter_transaction_delay_ms: 0,
			max_retry_attempts: 2,
			fallback_max_attempts: 3,
			from_address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
			storage_primary: "memory".to_string(),
			storage_cleanup_interval_seconds: 60,
			api: None,
		}
	}

	pub fn relayer_id(mut self, id: impl Into<String>) -> Self {
		self.relayer_id = id.into();
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	/// Replaces the provider set of the queue network.
	pub fn providers(mut self, providers: Vec<ProviderConfig>) -> Self {
		self.providers = providers;
		self
	}

	pub fn check_interval_seconds(mut self, seconds: u64) -> Self {
		self.check_interval_seconds = seconds;
		self
	}

	pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
		self.probe_timeout_ms = ms;
		self
	}

	pub fn inter_transaction_delay_ms(mut self, ms: u64) -> Self {
		self.inter_transaction_delay_ms = ms;
		self
	}

	pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
		self.max_retry_attempts = attempts;
		self
	}

	pub fn fallback_max_attempts(mut self, attempts: u32) -> Self {
		self.fallback_max_attempts = attempts;
		self
	}

	pub fn from_address(mut self, address: impl Into<String>) -> Self {
		self.from_address = address.into();
		self
	}

	pub fn storage_primary(mut self, primary: impl Into<String>) -> Self {
		self.storage_primary = primary.into();
		self
	}

	pub fn storage_cleanup_interval_seconds(mut self, interval: u64) -> Self {
		self.storage_cleanup_interval_seconds = interval;
		self
	}

	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	pub fn build(self) -> Config {
		let mut networks = HashMap::new();
		networks.insert(
			self.chain_id,
			NetworkConfig {
				name: format!("chain-{}", self.chain_id),
				providers: self.providers,
			},
		);

		let mut implementations = HashMap::new();
		implementations.insert(
			self.storage_primary.clone(),
			toml::Value::Table(toml::map::Map::new()),
		);

		Config {
			relayer: RelayerConfig {
				id: self.relayer_id,
			},
			networks,
			health: HealthConfig {
				check_interval_seconds: self.check_interval_seconds,
				probe_timeout_ms: self.probe_timeout_ms,
			},
			queue: QueueConfig {
				chain_id: self.chain_id,
				inter_transaction_delay_ms: self.inter_transaction_delay_ms,
				max_retry_attempts: self.max_retry_attempts,
				fallback_max_attempts: self.fallback_max_attempts,
			},
			delivery: DeliveryConfig {
				from_address: self.from_address,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations,
				cleanup_interval_seconds: self.storage_cleanup_interval_seconds,
			},
			api: self.api,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_defaults_describe_one_network() {
		let config = ConfigBuilder::new()
			.providers(vec![
				ProviderConfig::new("http://a", 0, 3),
				ProviderConfig::new("http://b", 1, 1),
			])
			.build();
		assert_eq!(config.networks.len(), 1);
		assert_eq!(config.networks[&config.queue.chain_id].providers.len(), 2);
		assert_eq!(config.queue.inter_transaction_delay_ms, 0);
		assert!(config.storage.implementations.contains_key("memory"));
	}
}
