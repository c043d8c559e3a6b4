/// Token returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
///
/// Ids are never reused within one bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Handler<E> = Box<dyn FnMut(&E) + Send>;

/// Synchronous multicast channel for one event type.
///
/// Handlers run on the publishing thread in registration order. Nothing is
/// buffered: an event published with no subscribers is dropped.
pub struct EventBus<E> {
    handlers: Vec<(SubscriptionId, Handler<E>)>,
    next_id: u64,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&E) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if `id` was not (or no longer) subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.handlers.iter().position(|(sid, _)| *sid == id) {
            Some(idx) => {
                self.handlers.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn publish(&mut self, event: &E) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
