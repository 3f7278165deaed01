//! Broadcast channel for queue events.

use relayer_types::QueueEvent;
use tokio::sync::broadcast;

/// Fan-out of `QueueEvent`s to any number of subscribers.
///
/// Publishing never blocks. Slow subscribers miss events rather than
/// holding up the queue.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Returns the number of subscribers that received the event; an error
	/// only means nobody is listening.
	pub fn publish(
		&self,
		event: QueueEvent,
	) -> Result<usize, broadcast::error::SendError<QueueEvent>> {
		self.sender.send(event)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1000)
	}
}
