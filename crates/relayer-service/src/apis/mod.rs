//! Handlers for the relayer HTTP API, grouped by resource.

pub mod history;
pub mod providers;
pub mod queue;
