//! Publish/subscribe with last-value replay.
//!
//! Observers get the current value as soon as they subscribe, then every
//! later publish. Subscriptions are plain channel receivers, so an observer
//! that goes away is simply pruned on the next publish.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Subscription<T> {
    id: SubscriptionId,
    rx: Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Drain pending values and return the newest, if any arrived.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }
}

pub struct StateWatch<T: Clone> {
    current: T,
    subscribers: Vec<(SubscriptionId, Sender<T>)>,
    next_id: u64,
}

impl<T: Clone> StateWatch<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn subscribe(&mut self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        // Replay: the receiver is still held locally, so this cannot fail.
        let _ = tx.send(self.current.clone());
        self.subscribers.push((id, tx));
        Subscription { id, rx }
    }

    /// Returns false when `id` was not subscribed (already gone).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, value: T) {
        self.current = value;
        let current = &self.current;
        self.subscribers
            .retain(|(_, tx)| tx.send(current.clone()).is_ok());
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
