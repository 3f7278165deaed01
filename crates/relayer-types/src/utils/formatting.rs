//! String formatting helpers used in log lines and queue notifications.

/// Truncates an identifier or hash for display.
///
/// Keeps the first 10 characters (enough for `0x` plus 8 hex digits)
/// followed by "..".
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Shortens an address to its head and tail, e.g. `0x1234…abcd`.
pub fn short_address(address: &str) -> String {
	let body = without_0x_prefix(address);
	if body.len() <= 8 {
		return with_0x_prefix(body);
	}
	format!("0x{}…{}", &body[..4], &body[body.len() - 4..])
}

/// Adds a "0x" prefix to a hex string when it is missing.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a leading "0x" or "0X" from a hex string.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
