//! `eth_blockNumber` health probe.

use crate::client::is_truthy;
use crate::{HealthProbe, JsonRpcClient, ProviderError};
use async_trait::async_trait;
use serde_json::json;

/// Probes an endpoint with `eth_blockNumber`.
///
/// Healthy when the call returns 2xx with a truthy `result`.
#[derive(Debug, Clone, Default)]
pub struct JsonRpcProbe {
	client: JsonRpcClient,
}

impl JsonRpcProbe {
	pub fn new(client: JsonRpcClient) -> Self {
		Self { client }
	}
}

#[async_trait]
impl HealthProbe for JsonRpcProbe {
	async fn probe(&self, url: &str) -> Result<(), ProviderError> {
		let result = self.client.call(url, "eth_blockNumber", json!([])).await?;
		if is_truthy(&result) {
			Ok(())
		} else {
			Err(ProviderError::Unhealthy(format!(
				"eth_blockNumber returned {}",
				result
			)))
		}
	}
}
