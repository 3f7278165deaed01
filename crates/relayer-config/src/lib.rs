//! Configuration module for the relayer.
//!
//! Loads the relayer configuration from TOML, resolves `${VAR}` and
//! `${VAR:-default}` environment references and validates every section
//! before anything is built from it.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(any(test, feature = "testing"))]
pub mod builders;
mod loader;

pub use loader::ConfigLoader;

use regex::Regex;
use relayer_types::{networks::deserialize_networks, parse_address, NetworksConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The default Display dumps the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub relayer: RelayerConfig,
	/// Provider sets keyed by chain id.
	#[serde(deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
	#[serde(default)]
	pub health: HealthConfig,
	pub queue: QueueConfig,
	pub delivery: DeliveryConfig,
	pub storage: StorageConfig,
	pub api: Option<ApiConfig>,
}

/// Identity of this relayer instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayerConfig {
	pub id: String,
}

/// Provider health checking.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
	/// How long a health result is reused before the provider is probed again.
	#[serde(default = "default_check_interval_seconds")]
	pub check_interval_seconds: u64,
	/// Upper bound for a single probe.
	#[serde(default = "default_probe_timeout_ms")]
	pub probe_timeout_ms: u64,
}

impl HealthConfig {
	pub fn check_interval(&self) -> Duration {
		Duration::from_secs(self.check_interval_seconds)
	}

	pub fn probe_timeout(&self) -> Duration {
		Duration::from_millis(self.probe_timeout_ms)
	}
}

impl Default for HealthConfig {
	fn default() -> Self {
		Self {
			check_interval_seconds: default_check_interval_seconds(),
			probe_timeout_ms: default_probe_timeout_ms(),
		}
	}
}

fn default_check_interval_seconds() -> u64 {
	30
}

fn default_probe_timeout_ms() -> u64 {
	5000
}

/// Transaction queue behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
	/// Network the queue submits to. Must be one of `networks`.
	pub chain_id: u64,
	/// Pause between two consecutive submissions of a drain pass.
	#[serde(default = "default_inter_transaction_delay_ms")]
	pub inter_transaction_delay_ms: u64,
	/// Number of explicit retries allowed per failed entry.
	#[serde(default = "default_max_retry_attempts")]
	pub max_retry_attempts: u32,
	/// Per-provider attempt cap handed to fallback execution.
	#[serde(default = "default_fallback_max_attempts")]
	pub fallback_max_attempts: u32,
}

impl QueueConfig {
	pub fn inter_transaction_delay(&self) -> Duration {
		Duration::from_millis(self.inter_transaction_delay_ms)
	}
}

fn default_inter_transaction_delay_ms() -> u64 {
	1000
}

fn default_max_retry_attempts() -> u32 {
	2
}

fn default_fallback_max_attempts() -> u32 {
	3
}

/// Submission settings for `eth_sendTransaction`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
	/// Node-managed account that sends every queued transaction.
	pub from_address: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Implementation name to raw backend config.
	pub implementations: HashMap<String, toml::Value>,
	/// Interval in seconds for cleaning up expired storage entries.
	pub cleanup_interval_seconds: u64,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024
}

fn env_var_pattern() -> Result<&'static Regex, ConfigError> {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	if let Some(re) = PATTERN.get() {
		return Ok(re);
	}
	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;
	Ok(PATTERN.get_or_init(|| re))
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of VAR_NAME and supports defaults
/// with `${VAR_NAME:-default_value}`. Input is limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = env_var_pattern()?;
	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)));
			},
		};
		result.push_str(&input[last..full.start()]);
		result.push_str(&value);
		last = full.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Checks cross-field rules that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.relayer.id.trim().is_empty() {
			return Err(ConfigError::Validation("Relayer ID cannot be empty".into()));
		}

		self.validate_networks()?;

		if self.health.check_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"health.check_interval_seconds must be greater than 0".into(),
			));
		}
		if !(1..=60_000).contains(&self.health.probe_timeout_ms) {
			return Err(ConfigError::Validation(
				"health.probe_timeout_ms must be between 1 and 60000".into(),
			));
		}

		if !self.networks.contains_key(&self.queue.chain_id) {
			return Err(ConfigError::Validation(format!(
				"queue.chain_id {} is not a configured network",
				self.queue.chain_id
			)));
		}
		if self.queue.fallback_max_attempts == 0 {
			return Err(ConfigError::Validation(
				"queue.fallback_max_attempts must be at least 1".into(),
			));
		}

		parse_address(&self.delivery.from_address).map_err(|e| {
			ConfigError::Validation(format!("delivery.from_address: {}", e))
		})?;

		self.validate_storage()
	}

	fn validate_networks(&self) -> Result<(), ConfigError> {
		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"Networks configuration cannot be empty".into(),
			));
		}
		for (chain_id, network) in &self.networks {
			if network.providers.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} must have at least 1 provider configured",
					chain_id
				)));
			}
			let mut seen = HashSet::new();
			for provider in &network.providers {
				if provider.url.trim().is_empty() {
					return Err(ConfigError::Validation(format!(
						"Network {} has a provider with an empty url",
						chain_id
					)));
				}
				if !seen.insert(provider.url.as_str()) {
					return Err(ConfigError::Validation(format!(
						"Network {} lists provider '{}' more than once",
						chain_id, provider.url
					)));
				}
				if provider.max_retries == 0 {
					return Err(ConfigError::Validation(format!(
						"Provider '{}' on network {} must allow at least 1 retry",
						provider.url, chain_id
					)));
				}
			}
		}
		Ok(())
	}

	fn validate_storage(&self) -> Result<(), ConfigError> {
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}
		if !(1..=86_400).contains(&self.storage.cleanup_interval_seconds) {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds must be between 1 and 86400".into(),
			));
		}
		Ok(())
	}
}

/// Parses a TOML string, resolving environment references and validating.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[relayer]
id = "relayer-test"

[networks.31337]
name = "anvil"
[[networks.31337.providers]]
url = "http://localhost:8545"
priority = 0
[[networks.31337.providers]]
url = "http://localhost:8546"
priority = 1
max_retries = 2

[queue]
chain_id = 31337

[delivery]
from_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

[storage]
primary = "memory"
cleanup_interval_seconds = 3600
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("RELAYER_TEST_HOST", "localhost");
		std::env::set_var("RELAYER_TEST_PORT", "8545");

		let input = "url = \"http://${RELAYER_TEST_HOST}:${RELAYER_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("RELAYER_TEST_HOST");
		std::env::remove_var("RELAYER_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${RELAYER_MISSING_VAR:-fallback}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let err = resolve_env_vars("value = \"${RELAYER_MISSING_VAR}\"").unwrap_err();
		assert!(err.to_string().contains("RELAYER_MISSING_VAR"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.relayer.id, "relayer-test");
		assert_eq!(config.health.check_interval_seconds, 30);
		assert_eq!(config.health.probe_timeout(), Duration::from_millis(5000));
		assert_eq!(config.queue.inter_transaction_delay_ms, 1000);
		assert_eq!(config.queue.max_retry_attempts, 2);
		assert_eq!(config.queue.fallback_max_attempts, 3);

		let providers = &config.networks[&31337].providers;
		assert_eq!(providers[0].max_retries, 3);
		assert_eq!(providers[1].max_retries, 2);
		assert!(config.api.is_none());
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("RELAYER_TEST_ID", "from-env");
		let input = BASE.replace("relayer-test", "${RELAYER_TEST_ID}");
		let config: Config = input.parse().unwrap();
		assert_eq!(config.relayer.id, "from-env");
		std::env::remove_var("RELAYER_TEST_ID");
	}

	#[test]
	fn test_rejects_duplicate_provider_urls() {
		let input = BASE.replace("http://localhost:8546", "http://localhost:8545");
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("more than once"));
	}

	#[test]
	fn test_rejects_zero_max_retries() {
		let input = BASE.replace("max_retries = 2", "max_retries = 0");
		assert!(input.parse::<Config>().is_err());
	}

	#[test]
	fn test_rejects_unknown_queue_chain() {
		let input = BASE.replace("chain_id = 31337", "chain_id = 1");
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("queue.chain_id"));
	}

	#[test]
	fn test_rejects_bad_from_address() {
		let input = BASE.replace("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", "0x1234");
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("from_address"));
	}

	#[test]
	fn test_rejects_bad_health_settings() {
		let zero_ttl = format!("{}\n[health]\ncheck_interval_seconds = 0\n", BASE);
		assert!(zero_ttl.parse::<Config>().is_err());

		let slow_probe = format!("{}\n[health]\nprobe_timeout_ms = 120000\n", BASE);
		assert!(slow_probe.parse::<Config>().is_err());
	}

	#[test]
	fn test_rejects_missing_primary_storage() {
		let input = BASE.replace("primary = \"memory\"", "primary = \"file\"");
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file'"));
	}

	#[test]
	fn test_rejects_network_without_providers() {
		let input = format!("{}\n[networks.1]\nname = \"empty\"\nproviders = []\n", BASE);
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Network 1"));
	}
}
