//! Common types for the relayer.
//!
//! Shared data types used by every relayer crate: provider and network
//! configuration, queue entries, history records, events, API bodies and the
//! config validation framework.

/// API request/response bodies and the HTTP error type.
pub mod api;
/// Event types published on the queue event bus.
pub mod events;
/// Submitted transaction history records.
pub mod history;
/// Network configuration types.
pub mod networks;
/// RPC provider configuration, health and statistics.
pub mod provider;
/// Queue entries and run state.
pub mod queue;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Storage namespaces.
pub mod storage;
/// Utility functions for formatting and conversions.
pub mod utils;
/// Configuration validation types.
pub mod validation;

pub use alloy_primitives::{Address, U256};
pub use api::*;
pub use events::*;
pub use history::*;
pub use networks::{deserialize_networks, NetworkConfig, NetworksConfig};
pub use provider::*;
pub use queue::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use utils::{
	current_timestamp, current_timestamp_millis, decimal_to_quantity, generate_transaction_id,
	parse_address, short_address, truncate_id, with_0x_prefix, without_0x_prefix,
};
pub use validation::*;
