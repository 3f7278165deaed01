//! RPC provider fallback for the relayer.
//!
//! Routes JSON-RPC work through a prioritized set of endpoints per network.
//! Health results are cached per endpoint url in a tracker shared by every
//! network manager; operations fall back from one endpoint to the next on
//! failure. Transaction submission is built on top of the same fallback.

use async_trait::async_trait;
use relayer_types::QueuedTransaction;
use thiserror::Error;

pub mod client;
pub mod health;
pub mod manager;

/// Re-export implementations
pub mod implementations {
	pub mod probe;
	pub mod submitter;
}

pub use client::JsonRpcClient;
pub use health::ProviderHealthTracker;
pub use implementations::probe::JsonRpcProbe;
pub use implementations::submitter::RpcTransactionSubmitter;
pub use manager::{RpcProviderManager, DEFAULT_MAX_ATTEMPTS};

/// Errors produced while talking to RPC providers.
#[derive(Debug, Error)]
pub enum ProviderError {
	/// Transport failure or non-2xx HTTP status.
	#[error("Network error: {0}")]
	Network(String),
	/// The endpoint answered with a JSON-RPC error object.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	/// The endpoint answered with something that is not a usable response.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// A health probe reported the endpoint as unhealthy.
	#[error("Provider unhealthy: {0}")]
	Unhealthy(String),
	/// A health probe did not finish in time.
	#[error("Health probe timed out after {0} ms")]
	ProbeTimeout(u64),
	/// Every attempt against every provider failed.
	#[error("All providers failed after {attempts} attempts: {last_error}")]
	AllProvidersExhausted {
		attempts: u32,
		#[source]
		last_error: Box<ProviderError>,
	},
	/// No attempt could be made at all.
	#[error("All providers failed")]
	NoProviderAvailable,
	#[error("No providers configured for chain {0}")]
	UnknownNetwork(u64),
}

/// Checks whether an endpoint can serve requests.
///
/// `Ok(())` means healthy. The manager bounds every probe with its own
/// timeout, so implementations need not enforce one.
#[async_trait]
pub trait HealthProbe: Send + Sync {
	async fn probe(&self, url: &str) -> Result<(), ProviderError>;
}

/// Errors returned by a transaction submitter.
#[derive(Debug, Error)]
pub enum SubmitError {
	/// The transaction could not be encoded for submission.
	#[error("Invalid transaction: {0}")]
	InvalidTransaction(String),
	/// Submission was attempted and failed.
	#[error("Transaction submission failed: {0}")]
	TransactionSubmissionFailed(String),
}

impl SubmitError {
	/// The failure reason without the variant prefix.
	pub fn message(&self) -> &str {
		match self {
			SubmitError::InvalidTransaction(m) | SubmitError::TransactionSubmissionFailed(m) => m,
		}
	}
}

/// Submits a queued transaction and returns its hash.
///
/// The queue engine calls this once per drained entry and never retries on
/// its own; any fallback happens inside the implementation.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
	async fn submit(&self, tx: &QueuedTransaction) -> Result<String, SubmitError>;
}
