//! Minimal change notification.

use std::fmt;

/// Handle returned by [`Subscribers::subscribe`].
pub type SubscriptionId = u64;

/// A list of listeners notified synchronously, in subscription order.
pub struct Subscribers<E> {
    next_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_and_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::new();

        let sink = seen.clone();
        let id = subscribers.subscribe(move |event: &u32| sink.borrow_mut().push(*event));
        subscribers.notify(&1);
        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        subscribers.notify(&2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(subscribers.is_empty());
    }
}
