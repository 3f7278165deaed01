//! Utility functions shared across the relayer crates.

pub mod conversion;
pub mod formatting;
pub mod helpers;

pub use conversion::{decimal_to_quantity, parse_address};
pub use formatting::{short_address, truncate_id, with_0x_prefix, without_0x_prefix};
pub use helpers::{current_timestamp, current_timestamp_millis, generate_transaction_id};
