//! Per-endpoint health cache shared by all provider managers.

use dashmap::DashMap;
use relayer_types::{current_timestamp_millis, ProviderHealthRecord};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Entry {
	healthy: bool,
	/// Monotonic time of the check, used for the TTL.
	checked: Instant,
	/// Wall-clock time of the check, reported in stats.
	checked_at_ms: u64,
}

/// Health records keyed by provider url.
///
/// Records for different urls are independent; writing one never locks
/// another. A record is considered fresh for `ttl` after it was written.
#[derive(Debug)]
pub struct ProviderHealthTracker {
	records: DashMap<String, Entry>,
	ttl: Duration,
}

impl ProviderHealthTracker {
	pub fn new(ttl: Duration) -> Self {
		Self {
			records: DashMap::new(),
			ttl,
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the cached flag if it was written less than `ttl` ago.
	pub fn fresh(&self, url: &str) -> Option<bool> {
		self.records
			.get(url)
			.filter(|entry| entry.checked.elapsed() < self.ttl)
			.map(|entry| entry.healthy)
	}

	/// Writes the flag and both timestamps together.
	pub fn record(&self, url: &str, healthy: bool) {
		let entry = Entry {
			healthy,
			checked: Instant::now(),
			checked_at_ms: current_timestamp_millis(),
		};
		if let Some(previous) = self.records.insert(url.to_string(), entry) {
			if previous.healthy != healthy {
				tracing::info!(url, healthy, "Provider health changed");
			}
		}
	}

	/// Last record regardless of age.
	pub fn snapshot(&self, url: &str) -> Option<ProviderHealthRecord> {
		self.records.get(url).map(|entry| ProviderHealthRecord {
			healthy: entry.healthy,
			last_checked_at: entry.checked_at_ms,
		})
	}
}
