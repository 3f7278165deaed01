//! Conversions between user-facing strings and JSON-RPC encodings.

use alloy_primitives::{Address, U256};

/// Parses a 0x-prefixed 20-byte hex address.
pub fn parse_address(s: &str) -> Result<Address, String> {
	s.parse::<Address>()
		.map_err(|e| format!("Invalid address '{}': {}", s, e))
}

/// Converts a decimal wei amount into a JSON-RPC hex quantity.
///
/// Quantities carry no leading zeros, so zero encodes as `0x0`.
pub fn decimal_to_quantity(value: &str) -> Result<String, String> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Ok("0x0".to_string());
	}
	let amount = U256::from_str_radix(trimmed, 10)
		.map_err(|e| format!("Invalid value '{}': {}", value, e))?;
	Ok(format!("0x{:x}", amount))
}
