// ============================================================================
// API CLIENT - HTTP only (stateless)
// ============================================================================
// No business logic here: builds requests, checks status, decodes bodies.
// ============================================================================

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;

use crate::config::CONFIG;
use crate::models::account::{Buyer, Seller};
use crate::models::listing::{Listing, ValidatedListing};

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(CONFIG.backend_url())
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Image URL for a listing card (`<img src>`; fetched by the browser)
    pub fn listing_image_url(&self, id: i64) -> String {
        format!("{}/product/displayproductimage?id={}", self.base_url, id)
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub async fn get_listings(&self) -> Result<Vec<Listing>, String> {
        let url = format!("{}/product/viewallproducts", self.base_url);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        let listings: Vec<Listing> = read_json(response).await?;
        log::info!("📦 [API] {} listings fetched", listings.len());
        Ok(listings)
    }

    pub async fn get_listing(&self, id: i64) -> Result<Listing, String> {
        let url = format!("{}/product/getproduct/{}", self.base_url, id);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_json(response).await
    }

    pub async fn get_seller_listings(&self, seller_id: i64) -> Result<Vec<Listing>, String> {
        let url = format!("{}/product/viewproductsbyseller/{}", self.base_url, seller_id);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_json(response).await
    }

    /// Multipart upload to `/product/addproduct`. Returns the server message.
    pub async fn create_listing(&self, listing: &ValidatedListing) -> Result<String, String> {
        let url = format!("{}/product/addproduct", self.base_url);
        let form = listing_form_data(listing).map_err(|e| format!("Form error: {:?}", e))?;

        log::info!("📤 [API] Creating listing '{}' ({} min)", listing.name, listing.timer_minutes);

        let response = Request::post(&url)
            .body(form)
            .map_err(|e| format!("Request build error: {}", e))?
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_text(response).await
    }

    // ------------------------------------------------------------------
    // Accounts (admin)
    // ------------------------------------------------------------------

    pub async fn get_sellers(&self) -> Result<Vec<Seller>, String> {
        let url = format!("{}/admin/viewallsellers", self.base_url);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_json(response).await
    }

    pub async fn get_buyers(&self) -> Result<Vec<Buyer>, String> {
        let url = format!("{}/admin/viewallbuyers", self.base_url);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_json(response).await
    }

    pub async fn approve_seller(&self, seller_id: i64) -> Result<String, String> {
        let url = format!("{}/seller/approve/{}", self.base_url, seller_id);
        log::info!("✅ [API] Approving seller {}", seller_id);
        let response = Request::put(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_text(response).await
    }

    pub async fn reject_seller(&self, seller_id: i64) -> Result<String, String> {
        let url = format!("{}/seller/reject/{}", self.base_url, seller_id);
        log::info!("⛔ [API] Rejecting seller {}", seller_id);
        let response = Request::put(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_text(response).await
    }

    pub async fn delete_seller(&self, seller_id: i64) -> Result<String, String> {
        let url = format!("{}/seller/delete", self.base_url);
        let response = Request::delete(&url)
            .query([("id", seller_id.to_string())])
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_text(response).await
    }

    pub async fn delete_buyer(&self, buyer_id: i64) -> Result<String, String> {
        let url = format!("{}/admin/deletebuyer", self.base_url);
        let response = Request::delete(&url)
            .query([("bid", buyer_id.to_string())])
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        read_text(response).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    if !response.ok() {
        return Err(http_error(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

async fn read_text(response: Response) -> Result<String, String> {
    if !response.ok() {
        return Err(http_error(response).await);
    }
    response
        .text()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

async fn http_error(response: Response) -> String {
    let status = response.status();
    let status_text = response.status_text();
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() { status_text } else { body };
    log::error!("❌ [API] HTTP {}: {}", status, detail);
    format!("HTTP {}: {}", status, detail)
}

fn listing_form_data(listing: &ValidatedListing) -> Result<web_sys::FormData, JsValue> {
    let form = web_sys::FormData::new()?;
    form.append_with_str("category", &listing.category)?;
    form.append_with_str("name", &listing.name)?;
    form.append_with_str("description", &listing.description)?;
    form.append_with_str("cost", &listing.cost.to_string())?;
    form.append_with_str("sid", &listing.seller_id.to_string())?;
    form.append_with_str("timer", &listing.timer_minutes.to_string())?;

    if let Some(image) = &listing.image {
        let bytes = js_sys::Uint8Array::from(image.bytes.as_slice());
        let parts = js_sys::Array::of1(&bytes);
        let blob = web_sys::Blob::new_with_u8_array_sequence(&parts)?;
        form.append_with_blob_and_filename("productimage", &blob, &image.file_name)?;
    }

    Ok(form)
}
