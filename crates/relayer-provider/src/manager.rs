//! Provider selection and fallback execution for one network.

use crate::{HealthProbe, ProviderError, ProviderHealthTracker};
use relayer_types::{ProviderConfig, ProviderStats};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Default per-provider attempt cap for fallback execution.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default upper bound for a single health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Picks endpoints for one network and executes operations with fallback.
///
/// Providers are kept sorted by priority ascending. The sort is stable, so
/// providers sharing a priority keep their declaration order.
pub struct RpcProviderManager {
	chain_id: u64,
	providers: Vec<ProviderConfig>,
	tracker: Arc<ProviderHealthTracker>,
	probe: Arc<dyn HealthProbe>,
	probe_timeout: Duration,
}

impl RpcProviderManager {
	pub fn new(
		chain_id: u64,
		mut providers: Vec<ProviderConfig>,
		tracker: Arc<ProviderHealthTracker>,
		probe: Arc<dyn HealthProbe>,
	) -> Self {
		providers.sort_by_key(|p| p.priority);
		Self {
			chain_id,
			providers,
			tracker,
			probe,
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
		}
	}

	pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
		self.probe_timeout = timeout;
		self
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	/// Providers in the order they are tried.
	pub fn providers(&self) -> &[ProviderConfig] {
		&self.providers
	}

	/// Returns the url of the first healthy provider in priority order.
	///
	/// If no provider is healthy the first one is returned anyway, so callers
	/// always get an endpoint to try.
	pub async fn get_active_provider(&self) -> Result<String, ProviderError> {
		for provider in &self.providers {
			if self.is_healthy(&provider.url).await {
				return Ok(provider.url.clone());
			}
		}
		let first = self
			.providers
			.first()
			.ok_or(ProviderError::UnknownNetwork(self.chain_id))?;
		tracing::warn!(
			chain_id = self.chain_id,
			url = %first.url,
			"No healthy provider, using highest priority"
		);
		Ok(first.url.clone())
	}

	/// Returns the cached health of `url`, probing it if the cache is stale.
	///
	/// Probe failures and timeouts count as unhealthy; this never errors.
	pub async fn is_healthy(&self, url: &str) -> bool {
		if let Some(healthy) = self.tracker.fresh(url) {
			return healthy;
		}

		let healthy = match tokio::time::timeout(self.probe_timeout, self.probe.probe(url)).await {
			Ok(Ok(())) => true,
			Ok(Err(e)) => {
				tracing::debug!(url, error = %e, "Health probe failed");
				false
			},
			Err(_) => {
				let e = ProviderError::ProbeTimeout(self.probe_timeout.as_millis() as u64);
				tracing::debug!(url, error = %e, "Health probe failed");
				false
			},
		};
		self.tracker.record(url, healthy);
		healthy
	}

	/// Runs `operation` against providers in priority order until it succeeds.
	///
	/// Each provider gets `min(max_attempts, provider.max_retries)` attempts.
	/// Every failure marks the provider unhealthy and every success marks it
	/// healthy. Cached health does not skip providers here.
	///
	/// # Errors
	///
	/// `AllProvidersExhausted` with the last error and the number of attempts
	/// when everything failed, or `NoProviderAvailable` if no attempt was made.
	#[instrument(skip_all, fields(chain_id = self.chain_id))]
	pub async fn execute_with_fallback<T, F, Fut>(
		&self,
		operation: F,
		max_attempts: u32,
	) -> Result<T, ProviderError>
	where
		F: Fn(String) -> Fut,
		Fut: Future<Output = Result<T, ProviderError>>,
	{
		let mut attempts = 0u32;
		let mut last_error = None;

		for provider in &self.providers {
			let budget = max_attempts.min(provider.max_retries);
			for attempt in 1..=budget {
				attempts += 1;
				match operation(provider.url.clone()).await {
					Ok(value) => {
						self.tracker.record(&provider.url, true);
						return Ok(value);
					},
					Err(e) => {
						tracing::warn!(
							url = %provider.url,
							attempt,
							budget,
							error = %e,
							"Provider attempt failed"
						);
						self.tracker.record(&provider.url, false);
						last_error = Some(e);
					},
				}
			}
		}

		match last_error {
			Some(e) => Err(ProviderError::AllProvidersExhausted {
				attempts,
				last_error: Box::new(e),
			}),
			None => Err(ProviderError::NoProviderAvailable),
		}
	}

	/// Snapshot of every provider and its last known health. Never probes.
	pub fn get_provider_stats(&self) -> Vec<ProviderStats> {
		self.providers
			.iter()
			.map(|provider| {
				let record = self.tracker.snapshot(&provider.url);
				ProviderStats {
					url: provider.url.clone(),
					priority: provider.priority,
					healthy: record.map(|r| r.healthy),
					last_checked_at: record.map(|r| r.last_checked_at),
				}
			})
			.collect()
	}
}
