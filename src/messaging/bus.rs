/// Fan-out of monitor events
///
/// The monitor thread is the only publisher; each subscriber owns its own
/// receiver, so every subscription is a single-producer/single-consumer
/// queue.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use tracing::trace;

use super::events::Event;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<Event>,
}

/// Event bus for broadcasting events to subscribers
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<Event>, SubscriberId) {
        let (tx, rx) = unbounded();
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber { id, sender: tx });
        (rx, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Deliver `event` to every live subscriber, dropping those whose receiver is gone
    pub fn publish(&self, event: Event) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|s| s.sender.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            trace!(event = event.name(), "No subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Region;

    #[test]
    fn test_event_bus_subscribe_and_unsubscribe() {
        let bus = EventBus::new();
        let (_rx, id) = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_publish() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();

        bus.publish(Event::AreaLocked {
            region: Region::new(1, 2, 3, 4),
        });

        match rx.try_recv().unwrap() {
            Event::AreaLocked { region } => assert_eq!(region, Region::new(1, 2, 3, 4)),
            other => panic!("Wrong event type received: {}", other.name()),
        }
    }

    #[test]
    fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new();
        let (rx1, _id1) = bus.subscribe();
        let (rx2, _id2) = bus.subscribe();

        bus.publish(Event::Shutdown);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        let (_kept, _) = bus.subscribe();
        drop(rx);

        bus.publish(Event::GameReset);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_bus_clone_shares_subscribers() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let (_rx, _id) = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
