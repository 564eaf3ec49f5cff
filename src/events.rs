//! Single-writer, multi-reader event fan-out
//!
//! Each subscriber owns an mpsc receiver. Unsubscribing removes the sender
//! from the list; dropping a receiver has the same effect on the next publish.

use std::sync::mpsc::{self, Receiver, Sender, TryIter};

/// Identifier returned by `EventBus::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

/// Receiving end of a bus subscription
#[derive(Debug)]
pub struct Subscription<E> {
    pub id: SubscriptionId,
    rx: Receiver<E>,
}

impl<E> Subscription<E> {
    /// Drain every event published since the last call
    pub fn drain(&self) -> TryIter<'_, E> {
        self.rx.try_iter()
    }

    /// Take the next pending event, if any
    pub fn try_next(&self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}

/// Observer list over mpsc channels
#[derive(Debug)]
pub struct EventBus<E> {
    subscribers: Vec<(SubscriptionId, Sender<E>)>,
    next_id: u32,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription<E> {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::channel();
        self.subscribers.push((id, tx));
        Subscription { id, rx }
    }

    /// Remove a subscriber. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every live subscriber, pruning dropped receivers
    pub fn publish(&mut self, event: &E) {
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
