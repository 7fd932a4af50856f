// ============================================================================
// FOOD RESCUE PWA - wasm client core
// ============================================================================
// Layers:
// - Models: shapes shared with the backend and localStorage
// - Services: HTTP only
// - State: cart store (Rc<RefCell>) + subscribers
// - ViewModels: UI logic, no DOM
// - App: browser wiring; exported functions below are the JS surface
// ============================================================================

pub mod app;
pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::app::{to_json, App};
use crate::config::CONFIG;
use crate::models::listing::{ImageUpload, NewListing};
use crate::viewmodels::{CatalogFilter, PaymentMethod};

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    if CONFIG.is_logging_enabled() {
        wasm_logger::init(wasm_logger::Config::default());
    }
    log::info!("🚀 Food Rescue client starting ({})", CONFIG.environment);

    let app = App::new()?;
    APP.with(|cell| {
        *cell.borrow_mut() = Some(Rc::new(app));
    });
    Ok(())
}

/// Clones the app handle out so no borrow of the cell outlives the call;
/// DOM events dispatched from inside may re-enter these exports.
fn app() -> Result<Rc<App>, JsValue> {
    APP.with(|cell| cell.borrow().clone())
        .ok_or_else(|| JsValue::from_str("App is not initialised"))
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    to_json(value)
}

// ----------------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn refresh_catalog() -> Result<(), JsValue> {
    app()?.refresh_catalog();
    Ok(())
}

/// Active listings matching the current filter, as JSON
#[wasm_bindgen]
pub fn visible_listings() -> Result<String, JsValue> {
    json(&app()?.visible_listings())
}

/// Accepts `{query, category, minCost, maxCost, sort}`; missing fields reset.
#[wasm_bindgen]
pub fn set_catalog_filter(filter_json: &str) -> Result<String, JsValue> {
    let filter: CatalogFilter = serde_json::from_str(filter_json).map_err(js_error)?;
    let app = app()?;
    app.set_catalog_filter(filter);
    json(&app.visible_listings())
}

#[wasm_bindgen]
pub fn catalog_stats() -> Result<String, JsValue> {
    json(&app()?.catalog_stats())
}

#[wasm_bindgen]
pub fn catalog_categories() -> Result<String, JsValue> {
    json(&app()?.categories())
}

#[wasm_bindgen]
pub fn catalog_error() -> Result<Option<String>, JsValue> {
    Ok(app()?.catalog_error())
}

#[wasm_bindgen]
pub fn listing_image_url(id: i32) -> Result<String, JsValue> {
    Ok(app()?.listing_image_url(i64::from(id)))
}

/// Call from the card's image `onload`; returns true the first time.
#[wasm_bindgen]
pub fn listing_image_loaded(id: i32) -> Result<bool, JsValue> {
    Ok(app()?.listing_image_loaded(i64::from(id)))
}

#[wasm_bindgen]
pub async fn listing_detail(id: i32) -> Result<String, JsValue> {
    let app = app()?;
    let detail = app.listing_detail(i64::from(id)).await.map_err(js_error)?;
    json(&detail)
}

// ----------------------------------------------------------------------------
// Cart / collection
// ----------------------------------------------------------------------------

/// Returns a `{level, message}` notice as JSON
#[wasm_bindgen]
pub fn add_to_cart(id: i32) -> Result<String, JsValue> {
    json(&app()?.add_to_cart(i64::from(id)))
}

#[wasm_bindgen]
pub fn add_to_collection(id: i32) -> Result<String, JsValue> {
    json(&app()?.add_to_collection(i64::from(id)))
}

#[wasm_bindgen]
pub fn remove_from_cart(id: i32) -> Result<(), JsValue> {
    app()?.store().remove(i64::from(id)).map_err(js_error)
}

#[wasm_bindgen]
pub fn remove_from_collection(id: i32) -> Result<(), JsValue> {
    app()?.store().remove_collected(i64::from(id)).map_err(js_error)
}

#[wasm_bindgen]
pub fn set_cart_quantity(id: i32, quantity: i32) -> Result<(), JsValue> {
    app()?
        .store()
        .set_quantity(i64::from(id), i64::from(quantity))
        .map_err(js_error)
}

#[wasm_bindgen]
pub fn clear_cart() -> Result<(), JsValue> {
    app()?.store().clear().map_err(js_error)
}

/// Re-reads localStorage (e.g. after another tab changed it).
#[wasm_bindgen]
pub fn reload_cart() -> Result<(), JsValue> {
    app()?.store().reload();
    Ok(())
}

#[wasm_bindgen]
pub fn cart_items() -> Result<String, JsValue> {
    json(&app()?.store().items())
}

#[wasm_bindgen]
pub fn collect_items() -> Result<String, JsValue> {
    json(&app()?.store().collection())
}

#[wasm_bindgen]
pub fn cart_count() -> Result<usize, JsValue> {
    Ok(app()?.store().len())
}

#[wasm_bindgen]
pub fn cart_subtotal() -> Result<f64, JsValue> {
    Ok(app()?.store().subtotal())
}

// ----------------------------------------------------------------------------
// Checkout
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn checkout_summary() -> Result<String, JsValue> {
    json(&app()?.checkout_summary())
}

/// `"upi"` or `"cash"`; returns the matching instructions as JSON.
#[wasm_bindgen]
pub fn set_payment_method(method: &str) -> Result<String, JsValue> {
    let method: PaymentMethod =
        serde_json::from_value(serde_json::Value::String(method.to_lowercase())).map_err(js_error)?;
    let app = app()?;
    app.set_payment_method(method);
    json(&app.payment_instructions())
}

#[wasm_bindgen]
pub fn payment_instructions() -> Result<String, JsValue> {
    json(&app()?.payment_instructions())
}

#[wasm_bindgen]
pub fn confirm_checkout() -> Result<String, JsValue> {
    let notice = app()?.confirm_checkout().map_err(js_error)?;
    json(&notice)
}

// ----------------------------------------------------------------------------
// Donor
// ----------------------------------------------------------------------------

/// `form_json` carries `{sellerId, name, category, description, cost,
/// timerMinutes}`; the image travels as raw bytes.
#[wasm_bindgen]
pub async fn submit_listing(
    form_json: String,
    image_name: Option<String>,
    image_bytes: Option<Vec<u8>>,
) -> Result<String, JsValue> {
    let mut form: NewListing = serde_json::from_str(&form_json).map_err(js_error)?;
    if let Some(bytes) = image_bytes {
        form.image = Some(ImageUpload {
            file_name: image_name.unwrap_or_else(|| "image".to_string()),
            bytes,
        });
    }
    let app = app()?;
    app.submit_listing(form).await.map_err(js_error)
}

/// Seconds left on the last submission's countdown; `undefined` once done.
#[wasm_bindgen]
pub fn donor_countdown() -> Result<Option<f64>, JsValue> {
    Ok(app()?.donor().tick().map(|secs| secs as f64))
}

#[wasm_bindgen]
pub async fn seller_stats(seller_id: i32) -> Result<String, JsValue> {
    let app = app()?;
    let stats = app.donor().load_stats(i64::from(seller_id)).await.map_err(js_error)?;
    json(&stats)
}

// ----------------------------------------------------------------------------
// Admin
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub async fn admin_load() -> Result<String, JsValue> {
    let app = app()?;
    app.admin().load().await.map_err(js_error)?;
    json(&app.admin().counts())
}

#[wasm_bindgen]
pub fn admin_counts() -> Result<String, JsValue> {
    json(&app()?.admin().counts())
}

#[wasm_bindgen]
pub fn admin_sellers() -> Result<String, JsValue> {
    json(&app()?.admin().sellers())
}

#[wasm_bindgen]
pub fn admin_buyers() -> Result<String, JsValue> {
    json(&app()?.admin().buyers())
}

#[wasm_bindgen]
pub async fn approve_seller(seller_id: i32) -> Result<String, JsValue> {
    let app = app()?;
    app.admin().approve_seller(i64::from(seller_id)).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn reject_seller(seller_id: i32) -> Result<String, JsValue> {
    let app = app()?;
    app.admin().reject_seller(i64::from(seller_id)).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn delete_seller(seller_id: i32) -> Result<String, JsValue> {
    let app = app()?;
    app.admin().delete_seller(i64::from(seller_id)).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn delete_buyer(buyer_id: i32) -> Result<String, JsValue> {
    let app = app()?;
    app.admin().delete_buyer(i64::from(buyer_id)).await.map_err(js_error)
}
