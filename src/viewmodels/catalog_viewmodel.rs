// ============================================================================
// CATALOG VIEWMODEL - Browsing, filtering and adding to cart/collection
// ============================================================================
// Expiry is recomputed against the store's clock on every read; nothing is
// cached between calls.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::models::cart::Addition;
use crate::models::listing::{AnnotatedListing, Listing, ListingStatus};
use crate::models::notice::Notice;
use crate::services::catalog_service::CatalogService;
use crate::state::card_state::{CardState, CardStates};
use crate::state::cart_state::{CartError, CartStore};
use crate::utils::clock::Clock;
use crate::utils::storage::KeyValueStorage;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Default,
    CostLow,
    CostHigh,
    Newest,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogFilter {
    pub query: String,
    pub category: Option<String>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    pub sort: SortOrder,
}

impl CatalogFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        if !listing.matches_query(&self.query) {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if listing.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_cost {
            if listing.cost < min {
                return false;
            }
        }
        if let Some(max) = self.max_cost {
            if listing.cost > max {
                return false;
            }
        }
        true
    }

    fn sort(&self, listings: &mut [AnnotatedListing]) {
        match self.sort {
            SortOrder::Default => {}
            SortOrder::CostLow => {
                listings.sort_by(|a, b| a.listing.cost.total_cmp(&b.listing.cost))
            }
            SortOrder::CostHigh => {
                listings.sort_by(|a, b| b.listing.cost.total_cmp(&a.listing.cost))
            }
            // Listings without a timestamp go last
            SortOrder::Newest => {
                listings.sort_by(|a, b| b.listing.created_at.cmp(&a.listing.created_at))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

pub struct CatalogViewModel<A, S, C>
where
    A: CatalogService,
    S: KeyValueStorage,
    C: Clock,
{
    service: A,
    store: Rc<CartStore<S, C>>,
    listings: Vec<Listing>,
    filter: CatalogFilter,
    error: Option<String>,
    loading: bool,
    cards: CardStates,
}

impl<A, S, C> CatalogViewModel<A, S, C>
where
    A: CatalogService,
    S: KeyValueStorage,
    C: Clock,
{
    pub fn new(service: A, store: Rc<CartStore<S, C>>) -> Self {
        Self {
            service,
            store,
            listings: Vec::new(),
            filter: CatalogFilter::default(),
            error: None,
            loading: false,
            cards: CardStates::new(),
        }
    }

    pub fn service(&self) -> &A {
        &self.service
    }

    pub fn store(&self) -> &Rc<CartStore<S, C>> {
        &self.store
    }

    /// Fetches the whole catalog. On failure the previous listings stay.
    pub async fn load(&mut self) -> Result<usize, String> {
        self.begin_load();
        let result = self.service.fetch_listings().await;
        self.apply_fetch(result)
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Applies a fetch done elsewhere (so callers holding the view-model in a
    /// `RefCell` don't keep it borrowed across the await).
    pub fn apply_fetch(&mut self, result: Result<Vec<Listing>, String>) -> Result<usize, String> {
        self.loading = false;
        match result {
            Ok(listings) => {
                let ids: Vec<i64> = listings.iter().map(|l| l.id).collect();
                self.cards.retain(&ids);
                self.listings = listings;
                self.error = None;
                log::info!("📦 [CATALOG] {} listings loaded", self.listings.len());
                Ok(self.listings.len())
            }
            Err(e) => {
                log::error!("❌ [CATALOG] Failed to fetch listings: {}", e);
                let message = format!("Failed to fetch products: {}", e);
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Detail pages show the listing even when expired.
    pub async fn listing_detail(&self, id: i64) -> Result<AnnotatedListing, String> {
        let result = self.service.fetch_listing(id).await;
        self.apply_detail(id, result)
    }

    pub fn apply_detail(&self, id: i64, result: Result<Listing, String>) -> Result<AnnotatedListing, String> {
        let listing = result.map_err(|e| {
            log::error!("❌ [CATALOG] Failed to fetch listing {}: {}", id, e);
            format!("Failed to fetch product details. {}", e)
        })?;
        Ok(listing.annotate(self.store.now()))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn find(&self, id: i64) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CatalogFilter) {
        self.filter = filter;
    }

    /// Every fetched listing with its status as of now.
    pub fn annotated(&self) -> Vec<AnnotatedListing> {
        let now = self.store.now();
        self.listings.iter().map(|l| l.annotate(now)).collect()
    }

    /// Default browsing view: active listings matching the current filter.
    pub fn visible(&self) -> Vec<AnnotatedListing> {
        let mut visible: Vec<AnnotatedListing> = self
            .annotated()
            .into_iter()
            .filter(|a| a.status == ListingStatus::Active)
            .filter(|a| self.filter.matches(&a.listing))
            .collect();
        self.filter.sort(&mut visible);
        visible
    }

    pub fn stats(&self) -> CatalogStats {
        let now = self.store.now();
        let expired = self.listings.iter().filter(|l| l.is_expired(now)).count();
        CatalogStats {
            total: self.listings.len(),
            active: self.listings.len() - expired,
            expired,
        }
    }

    /// Distinct non-empty categories, in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for listing in &self.listings {
            if !listing.category.is_empty() && !categories.contains(&listing.category) {
                categories.push(listing.category.clone());
            }
        }
        categories
    }

    pub fn related(&self, listing: &Listing, limit: usize) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|l| l.category == listing.category && l.id != listing.id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn card_state(&self, id: i64) -> CardState {
        self.cards.state(id)
    }

    pub fn image_loaded(&self, id: i64) -> bool {
        self.cards.image_loaded(id)
    }

    // ------------------------------------------------------------------
    // Cart / collection
    // ------------------------------------------------------------------

    pub fn add_to_cart(&self, listing: &Listing) -> Notice {
        add_to_cart(&self.store, listing)
    }

    pub fn add_to_collection(&self, listing: &Listing) -> Notice {
        add_to_collection(&self.store, listing)
    }
}

// Store subscribers run synchronously inside these calls and may reach back
// into the view-model, so callers holding it in a `RefCell` must release
// their borrow first and call these directly.

pub fn add_to_cart<S: KeyValueStorage, C: Clock>(store: &CartStore<S, C>, listing: &Listing) -> Notice {
    match store.add(listing) {
        Ok(_) => Notice::success("Added to cart!"),
        Err(e @ CartError::AlreadyPresent { .. }) => Notice::info(e.to_string()),
        Err(e) => Notice::error(e.to_string()),
    }
}

pub fn add_to_collection<S: KeyValueStorage, C: Clock>(store: &CartStore<S, C>, listing: &Listing) -> Notice {
    match store.collect(listing) {
        Ok(outcome) => match outcome.collected {
            Addition::Added => Notice::success("Added to collection list!"),
            _ => Notice::info("This item is already in your collection list"),
        },
        Err(e) => Notice::error(e.to_string()),
    }
}

/// Detail page data: the listing (expired or not) plus related listings.
/// Fetches through `service` so no borrow of `catalog` spans an await; an
/// empty catalog (deep link before the first load) is filled first.
pub async fn load_detail<F, A, S, C>(
    catalog: &RefCell<CatalogViewModel<A, S, C>>,
    service: &F,
    id: i64,
    limit: usize,
) -> Result<(AnnotatedListing, Vec<Listing>), String>
where
    F: CatalogService,
    A: CatalogService,
    S: KeyValueStorage,
    C: Clock,
{
    let result = service.fetch_listing(id).await;
    let detail = catalog.borrow().apply_detail(id, result)?;

    if catalog.borrow().listings().is_empty() {
        match service.fetch_listings().await {
            Ok(listings) => {
                let _loaded = catalog.borrow_mut().apply_fetch(Ok(listings));
            }
            Err(e) => log::warn!("⚠️ [CATALOG] No related listings for {}: {}", id, e),
        }
    }

    let related = catalog.borrow().related(&detail.listing, limit);
    Ok((detail, related))
}
