//! RPC provider types.
//!
//! A provider is a single JSON-RPC endpoint with a priority and a retry
//! budget. Health records and statistics are keyed by the provider url.

use serde::{Deserialize, Serialize};

/// Configuration of a single RPC endpoint.
///
/// # Fields
///
/// * `url` - HTTP(S) endpoint, unique within one network's provider set
/// * `priority` - Lower values are tried first; ties keep declaration order
/// * `max_retries` - Attempts allowed against this endpoint for one operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderConfig {
	pub url: String,
	#[serde(default)]
	pub priority: u32,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
}

fn default_max_retries() -> u32 {
	3
}

impl ProviderConfig {
	pub fn new(url: impl Into<String>, priority: u32, max_retries: u32) -> Self {
		Self {
			url: url.into(),
			priority,
			max_retries,
		}
	}
}

/// Last known health of a provider.
///
/// Both fields are always written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealthRecord {
	pub healthy: bool,
	/// UNIX time in milliseconds of the check that produced `healthy`.
	#[serde(rename = "lastCheckedAt")]
	pub last_checked_at: u64,
}

/// Read-only provider snapshot exported for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
	pub url: String,
	pub priority: u32,
	/// `None` until the provider has been checked or used once.
	pub healthy: Option<bool>,
	#[serde(rename = "lastCheckedAt")]
	pub last_checked_at: Option<u64>,
}
