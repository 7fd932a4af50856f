// ============================================================================
// REACTIVITY - Subscriber lists for state change notifications
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type SubscriptionId = usize;

type Callback<E> = Rc<dyn Fn(&E)>;

/// Observer list owned by a piece of state.
pub struct Subscribers<E> {
    next_id: Cell<SubscriptionId>,
    callbacks: RefCell<Vec<(SubscriptionId, Callback<E>)>>,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            callbacks: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.callbacks.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Returns whether the id was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Callbacks may subscribe or unsubscribe while being notified; changes
    /// take effect from the next notification.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    /// Delivers `event` to a single subscriber.
    pub fn notify_one(&self, id: SubscriptionId, event: &E) {
        let callback = self
            .callbacks
            .borrow()
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, cb)| cb.clone());
        if let Some(callback) = callback {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_every_subscriber() {
        let subs: Subscribers<u32> = Subscribers::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = seen.clone();
        subs.subscribe(move |v| a.borrow_mut().push(("a", *v)));
        let b = seen.clone();
        subs.subscribe(move |v| b.borrow_mut().push(("b", *v)));

        subs.notify(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let subs: Subscribers<u32> = Subscribers::new();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        let id = subs.subscribe(move |_| c.set(c.get() + 1));
        subs.notify(&1);
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        subs.notify(&2);

        assert_eq!(count.get(), 1);
        assert!(subs.is_empty());
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let subs: Rc<Subscribers<u32>> = Rc::new(Subscribers::new());
        let count = Rc::new(Cell::new(0));

        let inner = subs.clone();
        let c = count.clone();
        let own_id = Rc::new(Cell::new(None));
        let own = own_id.clone();
        let id = subs.subscribe(move |_| {
            c.set(c.get() + 1);
            if let Some(id) = own.get() {
                inner.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        subs.notify(&1);
        subs.notify(&2);
        assert_eq!(count.get(), 1);
    }
}
