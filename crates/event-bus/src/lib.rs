//! Broadcast bus carrying user-facing engine notifications.

pub mod notice;

pub use notice::{Notice, NoticeLevel};

use std::sync::Arc;

use tokio::sync::broadcast;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

/// Simple in-memory bus suitable for unit tests and single-process runs.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Fire-and-forget publish; a bus with no listeners is not an error.
    pub fn emit(&self, event: E) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notices_reach_subscribers() {
        let bus: Arc<InMemoryBus<Notice>> = InMemoryBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit(Notice::warning("blocked element looks structural"));
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus: Arc<InMemoryBus<Notice>> = InMemoryBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        bus.emit(Notice::info("rules reloaded"));
        assert_eq!(first.recv().await.unwrap().message, "rules reloaded");
        assert_eq!(second.recv().await.unwrap().message, "rules reloaded");
    }
}
