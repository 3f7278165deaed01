//! Minimal JSON-RPC 2.0 client over HTTP.

use crate::ProviderError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	#[serde(default)]
	result: Option<Value>,
	#[serde(default)]
	error: Option<RpcErrorObject>,
}

/// Sends single JSON-RPC calls to arbitrary endpoint urls.
///
/// The client is not bound to an endpoint so one instance can serve every
/// provider of a manager.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
	http: reqwest::Client,
}

impl Default for JsonRpcClient {
	fn default() -> Self {
		Self::new()
	}
}

impl JsonRpcClient {
	pub fn new() -> Self {
		Self {
			http: reqwest::Client::new(),
		}
	}

	/// Client whose requests give up after `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
		let http = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ProviderError::Network(e.to_string()))?;
		Ok(Self { http })
	}

	/// Performs a call and returns the raw `result` value, which may be null.
	///
	/// # Errors
	///
	/// `Network` for transport failures and non-2xx statuses, `Rpc` when the
	/// body carries an error object, `InvalidResponse` for unparsable bodies.
	pub async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, ProviderError> {
		let body = json!({
			"jsonrpc": "2.0",
			"method": method,
			"params": params,
			"id": 1,
		});

		let response = self
			.http
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(|e| ProviderError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(ProviderError::Network(format!("HTTP status {}", status)));
		}

		let parsed: RpcResponse = response
			.json()
			.await
			.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

		if let Some(error) = parsed.error {
			return Err(ProviderError::Rpc {
				code: error.code,
				message: error.message,
			});
		}
		Ok(parsed.result.unwrap_or(Value::Null))
	}
}

/// Truthiness of a JSON value: null, false, 0 and "" are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
