//! Storage-related types for the relayer.

use std::str::FromStr;

/// Storage namespaces.
///
/// Replaces string literals in storage calls with typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// History records keyed by transaction hash
	History,
	/// Submission-ordered list of history hashes
	HistoryIndex,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::History => "history",
			StorageKey::HistoryIndex => "history_index",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::History, Self::HistoryIndex].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"history" => Ok(Self::History),
			"history_index" => Ok(Self::HistoryIndex),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
