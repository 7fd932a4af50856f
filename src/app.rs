// ============================================================================
// APP - Browser composition root
// ============================================================================
// Wires the cart store, view-models and API client together, forwards store
// events to the DOM and keeps the catalog's expiry view fresh.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit};

use crate::config::CONFIG;
use crate::models::cart::CartEvent;
use crate::models::listing::{AnnotatedListing, Listing, NewListing};
use crate::models::notice::Notice;
use crate::services::ApiClient;
use crate::state::cart_state::CartStore;
use crate::state::reactivity::SubscriptionId;
use crate::utils::clock::SystemClock;
use crate::utils::constants::{
    CART_UPDATED_EVENT, CATALOG_UPDATED_EVENT, COLLECT_UPDATED_EVENT, RELATED_LISTINGS_LIMIT,
};
use crate::utils::storage::LocalStorage;
use crate::viewmodels::catalog_viewmodel;
use crate::viewmodels::{
    AdminViewModel, CatalogFilter, CatalogStats, CatalogViewModel, CheckoutSummary, CheckoutViewModel,
    DonorViewModel, PaymentInstructions, PaymentMethod,
};

pub type BrowserStore = CartStore<LocalStorage, SystemClock>;
pub type BrowserCatalog = CatalogViewModel<ApiClient, LocalStorage, SystemClock>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: AnnotatedListing,
    pub image_url: String,
    pub related: Vec<Listing>,
}

/// Main application
pub struct App {
    api: ApiClient,
    store: Rc<BrowserStore>,
    catalog: Rc<RefCell<BrowserCatalog>>,
    checkout: RefCell<CheckoutViewModel>,
    donor: DonorViewModel<ApiClient, SystemClock>,
    admin: AdminViewModel<ApiClient>,
    subscription: SubscriptionId,
    _expiry_timer: Interval,
}

impl App {
    pub fn new() -> Result<Self, JsValue> {
        web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;

        let api = ApiClient::new();
        log::info!("🌐 [APP] Backend: {}", api.base_url());

        let store = Rc::new(CartStore::with_config(LocalStorage, SystemClock, CONFIG.cart));
        let subscription = store.subscribe(|event| {
            if let Err(e) = dispatch_cart_event(event) {
                log::warn!("⚠️ [APP] Could not dispatch cart event: {:?}", e);
            }
        });

        let catalog = Rc::new(RefCell::new(CatalogViewModel::new(api.clone(), store.clone())));
        let expiry_timer = start_expiry_timer(catalog.clone(), CONFIG.expiry_refresh_seconds);

        let app = Self {
            donor: DonorViewModel::new(api.clone(), SystemClock),
            admin: AdminViewModel::new(api.clone()),
            checkout: RefCell::new(CheckoutViewModel::new()),
            api,
            store,
            catalog,
            subscription,
            _expiry_timer: expiry_timer,
        };
        app.refresh_catalog();
        Ok(app)
    }

    pub fn store(&self) -> &Rc<BrowserStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// Refetches in the background; `catalogUpdated` fires when it lands.
    pub fn refresh_catalog(&self) {
        let catalog = self.catalog.clone();
        let api = self.api.clone();
        catalog.borrow_mut().begin_load();

        wasm_bindgen_futures::spawn_local(async move {
            let result = api.get_listings().await;
            let applied = catalog.borrow_mut().apply_fetch(result);
            if applied.is_ok() {
                notify_catalog(&catalog);
            }
        });
    }

    pub fn visible_listings(&self) -> Vec<AnnotatedListing> {
        self.catalog.borrow().visible()
    }

    pub fn set_catalog_filter(&self, filter: CatalogFilter) {
        self.catalog.borrow_mut().set_filter(filter);
    }

    pub fn catalog_stats(&self) -> CatalogStats {
        self.catalog.borrow().stats()
    }

    pub fn categories(&self) -> Vec<String> {
        self.catalog.borrow().categories()
    }

    pub fn catalog_error(&self) -> Option<String> {
        self.catalog.borrow().error().map(str::to_string)
    }

    pub fn listing_image_url(&self, id: i64) -> String {
        self.api.listing_image_url(id)
    }

    pub fn listing_image_loaded(&self, id: i64) -> bool {
        self.catalog.borrow().image_loaded(id)
    }

    pub async fn listing_detail(&self, id: i64) -> Result<ListingDetail, String> {
        let was_empty = self.catalog.borrow().listings().is_empty();
        let (listing, related) =
            catalog_viewmodel::load_detail(&self.catalog, &self.api, id, RELATED_LISTINGS_LIMIT).await?;
        if was_empty && !self.catalog.borrow().listings().is_empty() {
            notify_catalog(&self.catalog);
        }
        Ok(ListingDetail {
            image_url: self.api.listing_image_url(id),
            listing,
            related,
        })
    }

    // ------------------------------------------------------------------
    // Cart / collection
    // ------------------------------------------------------------------

    // The catalog borrow ends before the store notifies: listeners of the
    // DOM events may call back into the exports.

    pub fn add_to_cart(&self, id: i64) -> Notice {
        let listing = self.catalog.borrow().find(id).cloned();
        match listing {
            Some(listing) => catalog_viewmodel::add_to_cart(&self.store, &listing),
            None => Notice::error("This item is no longer available"),
        }
    }

    pub fn add_to_collection(&self, id: i64) -> Notice {
        let listing = self.catalog.borrow().find(id).cloned();
        match listing {
            Some(listing) => catalog_viewmodel::add_to_collection(&self.store, &listing),
            None => Notice::error("This item is no longer available"),
        }
    }

    // ------------------------------------------------------------------
    // Checkout
    // ------------------------------------------------------------------

    pub fn checkout_summary(&self) -> CheckoutSummary {
        self.checkout.borrow().summary(&self.store)
    }

    pub fn set_payment_method(&self, method: PaymentMethod) {
        self.checkout.borrow_mut().set_payment_method(method);
    }

    pub fn payment_instructions(&self) -> PaymentInstructions {
        let checkout = self.checkout.borrow();
        checkout.instructions(&checkout.summary(&self.store))
    }

    pub fn confirm_checkout(&self) -> Result<Notice, String> {
        let checkout = self.checkout.borrow().clone();
        checkout.confirm(&self.store)
    }

    // ------------------------------------------------------------------
    // Donor / admin
    // ------------------------------------------------------------------

    pub fn donor(&self) -> &DonorViewModel<ApiClient, SystemClock> {
        &self.donor
    }

    pub fn admin(&self) -> &AdminViewModel<ApiClient> {
        &self.admin
    }

    /// A listing just created shows up in the catalog on the next refresh.
    pub async fn submit_listing(&self, form: NewListing) -> Result<String, String> {
        self.donor.submit(form).await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

fn start_expiry_timer(catalog: Rc<RefCell<BrowserCatalog>>, seconds: u32) -> Interval {
    let millis = seconds.max(1).saturating_mul(1000);
    Interval::new(millis, move || notify_catalog(&catalog))
}

/// Listings have no push channel; views re-read `visible_listings` on this.
fn notify_catalog(catalog: &Rc<RefCell<BrowserCatalog>>) {
    let stats = match catalog.try_borrow() {
        Ok(catalog) => catalog.stats(),
        Err(_) => return,
    };
    let detail = js_sys::Object::new();
    let set = |key: &str, value: usize| {
        js_sys::Reflect::set(&detail, &JsValue::from_str(key), &JsValue::from_f64(value as f64))
    };
    let dispatched = set("total", stats.total)
        .and_then(|_| set("active", stats.active))
        .and_then(|_| set("expired", stats.expired))
        .and_then(|_| dispatch(CATALOG_UPDATED_EVENT, &detail));
    if let Err(e) = dispatched {
        log::warn!("⚠️ [APP] Could not dispatch {}: {:?}", CATALOG_UPDATED_EVENT, e);
    }
}

fn dispatch_cart_event(event: &CartEvent) -> Result<bool, JsValue> {
    let (name, key, count) = match *event {
        CartEvent::CartChanged { cart_count } => (CART_UPDATED_EVENT, "cartCount", cart_count),
        CartEvent::CollectChanged { collect_count } => {
            (COLLECT_UPDATED_EVENT, "collectCount", collect_count)
        }
    };
    let detail = js_sys::Object::new();
    js_sys::Reflect::set(&detail, &JsValue::from_str(key), &JsValue::from_f64(count as f64))?;
    dispatch(name, &detail)
}

fn dispatch(name: &str, detail: &JsValue) -> Result<bool, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
    let init = CustomEventInit::new();
    init.set_detail(detail);
    let event = CustomEvent::new_with_event_init_dict(name, &init)?;
    window.dispatch_event(&event)
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialize error: {}", e)))
}
