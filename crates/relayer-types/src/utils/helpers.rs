//! Time and identifier helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UNIX time in seconds, or 0 if the clock is before the epoch.
pub fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Current UNIX time in milliseconds, or 0 if the clock is before the epoch.
pub fn current_timestamp_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or(0)
}

/// Generates a queue entry id from the creation time and a random suffix.
///
/// Ids look like `tx-1718000000000-3f2a9c1b` and sort by creation time.
pub fn generate_transaction_id(timestamp_ms: u64) -> String {
	let suffix = uuid::Uuid::new_v4().simple().to_string();
	format!("tx-{}-{}", timestamp_ms, &suffix[..8])
}
