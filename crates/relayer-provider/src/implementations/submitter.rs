//! Transaction submission through `eth_sendTransaction`.
//!
//! The sending account is managed by the node; the relayer never signs.

use crate::{
	JsonRpcClient, ProviderError, RpcProviderManager, SubmitError, TransactionSubmitter,
	DEFAULT_MAX_ATTEMPTS,
};
use async_trait::async_trait;
use relayer_types::{
	decimal_to_quantity, parse_address, short_address, truncate_id, with_0x_prefix, Address,
	QueuedTransaction,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Submits queued transactions via the provider manager's fallback.
pub struct RpcTransactionSubmitter {
	manager: Arc<RpcProviderManager>,
	client: JsonRpcClient,
	from: Address,
	max_attempts: u32,
}

impl RpcTransactionSubmitter {
	pub fn new(manager: Arc<RpcProviderManager>, client: JsonRpcClient, from: Address) -> Self {
		Self {
			manager,
			client,
			from,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
		}
	}

	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;
		self
	}

	/// Builds the single `eth_sendTransaction` parameter object.
	fn build_params(&self, tx: &QueuedTransaction) -> Result<Value, SubmitError> {
		let to = parse_address(&tx.to).map_err(SubmitError::InvalidTransaction)?;
		let value = decimal_to_quantity(&tx.value).map_err(SubmitError::InvalidTransaction)?;

		let mut call = Map::new();
		call.insert("from".into(), json!(self.from));
		call.insert("to".into(), json!(to));
		call.insert("value".into(), json!(value));
		if let Some(data) = tx.data.as_deref().filter(|d| !d.is_empty()) {
			call.insert("data".into(), json!(with_0x_prefix(data)));
		}
		Ok(json!([call]))
	}
}

#[async_trait]
impl TransactionSubmitter for RpcTransactionSubmitter {
	async fn submit(&self, tx: &QueuedTransaction) -> Result<String, SubmitError> {
		let params = self.build_params(tx)?;
		tracing::debug!(tx_id = %truncate_id(&tx.id), to = %short_address(&tx.to), "Submitting transaction");

		let result = self
			.manager
			.execute_with_fallback(
				|url| {
					let client = self.client.clone();
					let params = params.clone();
					async move {
						let result = client.call(&url, "eth_sendTransaction", params).await?;
						result.as_str().map(str::to_string).ok_or_else(|| {
							ProviderError::InvalidResponse(format!(
								"expected transaction hash, got {}",
								result
							))
						})
					}
				},
				self.max_attempts,
			)
			.await;

		result.map_err(|e| {
			let reason = match e {
				ProviderError::AllProvidersExhausted { last_error, .. } => match *last_error {
					ProviderError::Rpc { message, .. } => message,
					other => other.to_string(),
				},
				other => other.to_string(),
			};
			SubmitError::TransactionSubmissionFailed(reason)
		})
	}
}
