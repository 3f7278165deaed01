//! Network configuration types for multi-chain relaying.
//!
//! Each network owns a prioritized set of RPC providers. Chain ids are TOML
//! table keys, so they arrive as strings and are parsed here.

use crate::ProviderConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Configuration for a single blockchain network.
///
/// # Fields
///
/// * `name` - Human readable network name used in logs
/// * `providers` - RPC endpoints in declaration order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	#[serde(default)]
	pub name: String,
	pub providers: Vec<ProviderConfig>,
}

impl NetworkConfig {
	/// Returns the providers sorted by priority ascending.
	///
	/// The sort is stable so equal priorities keep their declaration order.
	pub fn providers_by_priority(&self) -> Vec<ProviderConfig> {
		let mut providers = self.providers.clone();
		providers.sort_by_key(|p| p.priority);
		providers
	}
}

/// Networks configuration mapping chain IDs to their configurations.
pub type NetworksConfig = HashMap<u64, NetworkConfig>;

/// Deserializes network tables keyed by chain id strings.
///
/// # Errors
///
/// Returns a deserialization error if a key cannot be parsed as a u64 or the
/// network table itself is invalid.
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, NetworkConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::with_capacity(string_map.len());

	for (key, value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain_id '{}': {}", key, e)))?;
		result.insert(chain_id, value);
	}

	Ok(result)
}
