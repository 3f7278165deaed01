//! Transaction history records.
//!
//! The history keeps one record per submitted transaction, keyed by hash.
//! Only the record shape lives here; storage is handled by `relayer-storage`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// On-chain status of a submitted transaction as known to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
	Submitted,
	Confirmed,
	Failed,
}

impl FromStr for HistoryStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"submitted" => Ok(Self::Submitted),
			"confirmed" => Ok(Self::Confirmed),
			"failed" => Ok(Self::Failed),
			other => Err(format!("Unknown history status '{}'", other)),
		}
	}
}

/// A submitted transaction as stored in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
	pub hash: String,
	/// Queue entry id that produced the submission.
	#[serde(rename = "queueId")]
	pub queue_id: String,
	pub chain_id: u64,
	pub to: String,
	pub value: String,
	pub description: String,
	pub status: HistoryStatus,
	/// Submission time in UNIX milliseconds.
	pub timestamp: u64,
	/// Last status change in UNIX milliseconds.
	#[serde(rename = "updatedAt")]
	pub updated_at: u64,
}
