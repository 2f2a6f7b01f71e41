//! Best-effort fan-out of committed vote changes to live observers.
use meme_arena_shared::types::VoteEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Publishes `VoteEvent`s on a bounded broadcast channel.
///
/// Slow subscribers lose the oldest events; publishing never waits.
#[derive(Debug, Clone)]
pub struct VoteNotifier {
    sender: broadcast::Sender<VoteEvent>,
}

impl VoteNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: VoteEvent) {
        match self.sender.send(event) {
            Ok(receivers) => debug!(receivers, "Vote event published"),
            Err(_) => debug!("Vote event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.sender.subscribe()
    }
}
