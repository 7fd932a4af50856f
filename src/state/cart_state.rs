// ============================================================================
// CART STATE - Cart + collection list persisted in localStorage
// ============================================================================
// Both lists live in one store so a combined "add to collection" writes them
// together. Every mutation persists before memory is updated; a failed
// write leaves both unchanged.
// ============================================================================

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::CartConfig;
use crate::models::cart::{Addition, CartEvent, CartItem, CollectItem, CollectOutcome};
use crate::models::listing::Listing;
use crate::state::reactivity::{SubscriptionId, Subscribers};
use crate::utils::clock::Clock;
use crate::utils::constants::{CART_STORAGE_KEY, COLLECT_STORAGE_KEY};
use crate::utils::storage::{load_json, save_json, KeyValueStorage};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CartError {
    #[error("This item is already in your cart")]
    AlreadyPresent { id: i64 },
    #[error("Cart is full! Maximum {max} items allowed. Please remove some before adding more.")]
    Full { max: usize },
    #[error("Could not save cart: {0}")]
    Storage(String),
}

pub struct CartStore<S: KeyValueStorage, C: Clock> {
    storage: S,
    clock: C,
    config: CartConfig,
    cart: RefCell<Vec<CartItem>>,
    collection: RefCell<Vec<CollectItem>>,
    subscribers: Subscribers<CartEvent>,
}

impl<S: KeyValueStorage, C: Clock> CartStore<S, C> {
    /// Loads both lists from storage with the default cart bounds.
    pub fn new(storage: S, clock: C) -> Self {
        Self::with_config(storage, clock, CartConfig::default())
    }

    pub fn with_config(storage: S, clock: C, config: CartConfig) -> Self {
        let cart: Vec<CartItem> = load_list(&storage, CART_STORAGE_KEY);
        let collection: Vec<CollectItem> = load_list(&storage, COLLECT_STORAGE_KEY);
        log::info!(
            "🛒 [CART] Loaded {} cart items, {} collection items",
            cart.len(),
            collection.len()
        );
        Self {
            storage,
            clock,
            config,
            cart: RefCell::new(cart),
            collection: RefCell::new(collection),
            subscribers: Subscribers::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn items(&self) -> Vec<CartItem> {
        self.cart.borrow().clone()
    }

    pub fn get(&self, id: i64) -> Option<CartItem> {
        self.cart.borrow().iter().find(|item| item.id == id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.cart.borrow().iter().any(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.cart.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.borrow().is_empty()
    }

    pub fn subtotal(&self) -> f64 {
        self.cart.borrow().iter().map(CartItem::line_total).sum()
    }

    pub fn collection(&self) -> Vec<CollectItem> {
        self.collection.borrow().clone()
    }

    pub fn collect_count(&self) -> usize {
        self.collection.borrow().len()
    }

    pub fn is_collected(&self, id: i64) -> bool {
        self.collection.borrow().iter().any(|item| item.id == id)
    }

    // ------------------------------------------------------------------
    // Cart mutations
    // ------------------------------------------------------------------

    /// Appends a line item with quantity 1. Never merges into an existing line.
    pub fn add(&self, listing: &Listing) -> Result<usize, CartError> {
        let count = {
            let mut cart = self.cart.borrow_mut();
            let next = self.cart_with(&cart, listing)?;
            self.write_cart(&next)?;
            *cart = next;
            cart.len()
        };

        log::info!("🛒 [CART] Added listing {} ({} items)", listing.id, count);
        self.subscribers.notify(&CartEvent::CartChanged { cart_count: count });
        Ok(count)
    }

    /// Absent ids are not an error; subscribers are still notified.
    pub fn remove(&self, id: i64) -> Result<(), CartError> {
        let count = {
            let mut cart = self.cart.borrow_mut();
            let next: Vec<CartItem> = cart.iter().filter(|item| item.id != id).cloned().collect();
            self.write_cart(&next)?;
            *cart = next;
            cart.len()
        };

        log::info!("🗑️ [CART] Removed listing {} ({} items)", id, count);
        self.subscribers.notify(&CartEvent::CartChanged { cart_count: count });
        Ok(())
    }

    /// Clamps into the configured quantity range. The item count doesn't
    /// change, so no notification is sent.
    pub fn set_quantity(&self, id: i64, requested: i64) -> Result<(), CartError> {
        let quantity = self.config.clamp_quantity(requested);
        let mut cart = self.cart.borrow_mut();
        if !cart.iter().any(|item| item.id == id) {
            return Ok(());
        }

        let next: Vec<CartItem> = cart
            .iter()
            .map(|item| {
                if item.id == id {
                    CartItem { quantity, ..item.clone() }
                } else {
                    item.clone()
                }
            })
            .collect();
        self.write_cart(&next)?;
        *cart = next;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CartError> {
        {
            let mut cart = self.cart.borrow_mut();
            self.write_cart(&[])?;
            cart.clear();
        }

        log::info!("🧹 [CART] Cleared");
        self.subscribers.notify(&CartEvent::CartChanged { cart_count: 0 });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Collection list
    // ------------------------------------------------------------------

    /// Adds the listing to the collection list and, when there's room, to
    /// the cart. Both keys are written together: if the second write fails
    /// the first is restored.
    pub fn collect(&self, listing: &Listing) -> Result<CollectOutcome, CartError> {
        let now = self.clock.now();
        let (outcome, cart_count, collect_count) = {
            let mut cart = self.cart.borrow_mut();
            let mut collection = self.collection.borrow_mut();

            let (next_collection, collected) = if collection.iter().any(|i| i.id == listing.id) {
                (None, Addition::AlreadyPresent)
            } else {
                let mut next = collection.clone();
                next.push(CollectItem::from_listing(listing, now));
                (Some(next), Addition::Added)
            };

            let (next_cart, carted) = match self.cart_with(&cart, listing) {
                Ok(next) => (Some(next), Addition::Added),
                Err(CartError::Full { .. }) => (None, Addition::Full),
                Err(_) => (None, Addition::AlreadyPresent),
            };

            if let Some(next) = &next_collection {
                self.write_collection(next)?;
            }
            if let Some(next) = &next_cart {
                if let Err(e) = self.write_cart(next) {
                    if next_collection.is_some() {
                        if let Err(restore) = self.write_collection(&collection) {
                            log::error!("❌ [CART] Could not restore collection list: {}", restore);
                        }
                    }
                    return Err(e);
                }
            }

            if let Some(next) = next_collection {
                *collection = next;
            }
            if let Some(next) = next_cart {
                *cart = next;
            }

            (CollectOutcome { collected, carted }, cart.len(), collection.len())
        };

        if outcome.collected == Addition::Added {
            self.subscribers.notify(&CartEvent::CollectChanged { collect_count });
        }
        if outcome.carted == Addition::Added {
            self.subscribers.notify(&CartEvent::CartChanged { cart_count });
        }
        log::info!("📋 [CART] Collect listing {}: {:?}", listing.id, outcome);
        Ok(outcome)
    }

    pub fn remove_collected(&self, id: i64) -> Result<(), CartError> {
        let count = {
            let mut collection = self.collection.borrow_mut();
            let next: Vec<CollectItem> =
                collection.iter().filter(|item| item.id != id).cloned().collect();
            self.write_collection(&next)?;
            *collection = next;
            collection.len()
        };

        self.subscribers.notify(&CartEvent::CollectChanged { collect_count: count });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sync + subscriptions
    // ------------------------------------------------------------------

    /// Re-reads both keys, picking up writes made by another tab.
    pub fn reload(&self) {
        let cart: Vec<CartItem> = load_list(&self.storage, CART_STORAGE_KEY);
        let collection: Vec<CollectItem> = load_list(&self.storage, COLLECT_STORAGE_KEY);
        let (cart_count, collect_count) = (cart.len(), collection.len());
        *self.cart.borrow_mut() = cart;
        *self.collection.borrow_mut() = collection;

        self.subscribers.notify(&CartEvent::CartChanged { cart_count });
        self.subscribers.notify(&CartEvent::CollectChanged { collect_count });
    }

    /// The new subscriber immediately receives the current counts, so it
    /// can't miss state that changed before it registered.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CartEvent) + 'static,
    {
        let id = self.subscribers.subscribe(callback);
        self.subscribers
            .notify_one(id, &CartEvent::CartChanged { cart_count: self.len() });
        self.subscribers
            .notify_one(id, &CartEvent::CollectChanged { collect_count: self.collect_count() });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ------------------------------------------------------------------

    fn cart_with(&self, cart: &[CartItem], listing: &Listing) -> Result<Vec<CartItem>, CartError> {
        if cart.iter().any(|item| item.id == listing.id) {
            return Err(CartError::AlreadyPresent { id: listing.id });
        }
        if cart.len() >= self.config.max_items {
            return Err(CartError::Full { max: self.config.max_items });
        }
        let mut next = cart.to_vec();
        next.push(CartItem::from_listing(listing, self.clock.now()));
        Ok(next)
    }

    fn write_cart(&self, items: &[CartItem]) -> Result<(), CartError> {
        save_json(&self.storage, CART_STORAGE_KEY, items).map_err(|e| {
            log::error!("❌ [CART] {}", e);
            CartError::Storage(e)
        })
    }

    fn write_collection(&self, items: &[CollectItem]) -> Result<(), CartError> {
        save_json(&self.storage, COLLECT_STORAGE_KEY, items).map_err(|e| {
            log::error!("❌ [CART] {}", e);
            CartError::Storage(e)
        })
    }
}

fn load_list<S, T>(storage: &S, key: &str) -> Vec<T>
where
    S: KeyValueStorage,
    T: DeserializeOwned,
{
    load_json(storage, key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::FixedClock;
    use crate::utils::storage::MemoryStorage;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;
    use std::rc::Rc;

    type TestStore = CartStore<Rc<MemoryStorage>, Rc<FixedClock>>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 8, 0, 0).unwrap()
    }

    fn listing(id: i64, cost: f64) -> Listing {
        Listing {
            id,
            name: format!("Item {}", id),
            category: "Produce".to_string(),
            description: None,
            cost,
            created_at: None,
            timer: None,
        }
    }

    fn store() -> (TestStore, Rc<MemoryStorage>, Rc<FixedClock>) {
        let storage = Rc::new(MemoryStorage::new());
        let clock = Rc::new(FixedClock::new(t0()));
        (CartStore::new(storage.clone(), clock.clone()), storage, clock)
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let (store, _, _) = store();
        assert_eq!(store.add(&listing(1, 10.0)), Ok(1));
        assert_eq!(store.add(&listing(1, 10.0)), Err(CartError::AlreadyPresent { id: 1 }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().quantity, 1);
    }

    #[test]
    fn eleventh_item_is_rejected() {
        let (store, _, _) = store();
        for id in 1..=10 {
            store.add(&listing(id, 1.0)).unwrap();
        }
        assert_eq!(store.add(&listing(11, 1.0)), Err(CartError::Full { max: 10 }));
        assert_eq!(store.len(), 10);
        assert!(!store.contains(11));
    }

    #[test]
    fn quantity_is_clamped() {
        let (store, storage, clock) = store();
        store.add(&listing(1, 10.0)).unwrap();

        store.set_quantity(1, 0).unwrap();
        assert_eq!(store.get(1).unwrap().quantity, 1);

        store.set_quantity(1, 999).unwrap();
        assert_eq!(store.get(1).unwrap().quantity, 10);

        store.set_quantity(1, 4).unwrap();
        let reloaded = CartStore::new(storage, clock);
        assert_eq!(reloaded.get(1).unwrap().quantity, 4);
    }

    #[test]
    fn set_quantity_on_unknown_id_is_a_noop() {
        let (store, storage, _) = store();
        store.set_quantity(42, 3).unwrap();
        assert!(store.is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn clear_empties_storage_and_subtotal() {
        let (store, storage, clock) = store();
        store.add(&listing(1, 10.0)).unwrap();
        store.add(&listing(2, 5.0)).unwrap();
        store.clear().unwrap();

        assert_eq!(storage.get_item(CART_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
        let reloaded = CartStore::new(storage, clock);
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.subtotal(), 0.0);
    }

    #[test]
    fn subtotal_multiplies_cost_by_quantity() {
        let (store, _, _) = store();
        store.add(&listing(1, 50.0)).unwrap();
        store.add(&listing(2, 30.0)).unwrap();
        store.set_quantity(1, 2).unwrap();
        assert_eq!(store.subtotal(), 130.0);
    }

    #[test]
    fn malformed_storage_loads_as_empty() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set_item(CART_STORAGE_KEY, "{").unwrap();
        storage.set_item(COLLECT_STORAGE_KEY, "not json").unwrap();

        let store = CartStore::new(storage, Rc::new(FixedClock::new(t0())));
        assert!(store.is_empty());
        assert_eq!(store.collect_count(), 0);

        store.add(&listing(1, 1.0)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_survives_reload() {
        let (store, storage, clock) = store();
        store.add(&listing(3, 12.5)).unwrap();
        let original = store.get(3).unwrap();

        clock.advance(Duration::hours(2));
        let reloaded = CartStore::new(storage, clock);
        let item = reloaded.get(3).unwrap();
        assert_eq!(item, original);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.added_at, t0());
    }

    #[test]
    fn remove_absent_is_not_an_error() {
        let (store, _, _) = store();
        store.add(&listing(1, 1.0)).unwrap();
        store.remove(99).unwrap();
        assert_eq!(store.len(), 1);
        store.remove(1).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn notifications_carry_counts() {
        let (store, _, _) = store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e| sink.borrow_mut().push(*e));

        store.add(&listing(1, 1.0)).unwrap();
        store.add(&listing(2, 1.0)).unwrap();
        store.set_quantity(1, 5).unwrap();
        store.remove(1).unwrap();
        store.clear().unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                CartEvent::CartChanged { cart_count: 0 },
                CartEvent::CollectChanged { collect_count: 0 },
                CartEvent::CartChanged { cart_count: 1 },
                CartEvent::CartChanged { cart_count: 2 },
                CartEvent::CartChanged { cart_count: 1 },
                CartEvent::CartChanged { cart_count: 0 },
            ]
        );
    }

    #[test]
    fn late_subscriber_sees_current_count() {
        let (store, _, _) = store();
        store.add(&listing(1, 1.0)).unwrap();
        store.add(&listing(2, 1.0)).unwrap();

        let latest = Rc::new(Cell::new(None));
        let sink = latest.clone();
        store.subscribe(move |e| {
            if let CartEvent::CartChanged { cart_count } = e {
                sink.set(Some(*cart_count));
            }
        });
        assert_eq!(latest.get(), Some(2));
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let (store, storage, clock) = store();
        store.add(&listing(1, 1.0)).unwrap();

        storage.set_read_only(true);
        assert!(matches!(store.add(&listing(2, 1.0)), Err(CartError::Storage(_))));
        assert!(matches!(store.set_quantity(1, 3), Err(CartError::Storage(_))));
        assert!(matches!(store.clear(), Err(CartError::Storage(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().quantity, 1);

        storage.set_read_only(false);
        let reloaded = CartStore::new(storage, clock);
        assert_eq!(reloaded.items(), store.items());
    }

    #[test]
    fn collect_adds_to_both_lists() {
        let (store, _, _) = store();
        let outcome = store.collect(&listing(5, 8.0)).unwrap();
        assert_eq!(outcome, CollectOutcome { collected: Addition::Added, carted: Addition::Added });
        assert_eq!(store.collection()[0].quantity, 8.0);
        assert!(store.contains(5));

        let again = store.collect(&listing(5, 8.0)).unwrap();
        assert_eq!(
            again,
            CollectOutcome { collected: Addition::AlreadyPresent, carted: Addition::AlreadyPresent }
        );
        assert_eq!(store.collect_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn collect_on_full_cart_still_collects() {
        let (store, _, _) = store();
        for id in 1..=10 {
            store.add(&listing(id, 1.0)).unwrap();
        }
        let outcome = store.collect(&listing(11, 1.0)).unwrap();
        assert_eq!(outcome, CollectOutcome { collected: Addition::Added, carted: Addition::Full });
        assert!(store.is_collected(11));
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn collect_is_all_or_nothing_on_write_failure() {
        let (store, storage, clock) = store();
        storage.set_read_only(true);
        assert!(store.collect(&listing(1, 1.0)).is_err());
        storage.set_read_only(false);

        assert_eq!(store.collect_count(), 0);
        assert!(store.is_empty());
        let reloaded = CartStore::new(storage, clock);
        assert_eq!(reloaded.collect_count(), 0);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn collect_restores_collection_when_cart_write_fails() {
        let (store, storage, clock) = store();
        store.collect(&listing(1, 2.0)).unwrap();
        let saved_collection = storage.get_item(COLLECT_STORAGE_KEY).unwrap();

        storage.fail_writes_to(CART_STORAGE_KEY);
        let err = store.collect(&listing(2, 3.0)).unwrap_err();
        assert!(matches!(err, CartError::Storage(_)));

        assert_eq!(storage.get_item(COLLECT_STORAGE_KEY).unwrap(), saved_collection);
        assert_eq!(store.collect_count(), 1);
        assert!(!store.is_collected(2));
        assert_eq!(store.len(), 1);

        let reloaded = CartStore::new(storage, clock);
        assert_eq!(reloaded.collect_count(), 1);
        assert!(!reloaded.contains(2));
    }

    #[test]
    fn reload_picks_up_other_writers() {
        let (store, storage, clock) = store();
        let other_tab = CartStore::new(storage, clock);
        other_tab.add(&listing(9, 2.0)).unwrap();

        assert!(store.is_empty());
        store.reload();
        assert!(store.contains(9));
    }
}
