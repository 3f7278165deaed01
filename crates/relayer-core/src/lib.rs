//! Core of the relayer.
//!
//! Holds the sequential transaction queue, the event bus its notifications
//! go through, and the builder that wires storage, provider managers and the
//! queue into a `RelayerEngine`.

pub mod builder;
pub mod engine;
pub mod queue;

pub use builder::{BuilderError, RelayerBuilder, RelayerFactories};
pub use engine::{event_bus::EventBus, EngineError, RelayerEngine};
pub use queue::{QueueError, QueueSettings, TransactionQueueEngine};
