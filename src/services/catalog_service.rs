// Service seams used by the view-models. `ApiClient` is the production
// implementation; tests plug in fakes.

use crate::models::account::{Buyer, Seller};
use crate::models::listing::{Listing, ValidatedListing};
use crate::services::api_client::ApiClient;

#[allow(async_fn_in_trait)]
pub trait CatalogService {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, String>;
    async fn fetch_listing(&self, id: i64) -> Result<Listing, String>;
}

#[allow(async_fn_in_trait)]
pub trait DonorService {
    async fn create_listing(&self, listing: &ValidatedListing) -> Result<String, String>;
    async fn fetch_seller_listings(&self, seller_id: i64) -> Result<Vec<Listing>, String>;
}

#[allow(async_fn_in_trait)]
pub trait AdminService {
    async fn fetch_sellers(&self) -> Result<Vec<Seller>, String>;
    async fn fetch_buyers(&self) -> Result<Vec<Buyer>, String>;
    async fn approve_seller(&self, seller_id: i64) -> Result<String, String>;
    async fn reject_seller(&self, seller_id: i64) -> Result<String, String>;
    async fn delete_seller(&self, seller_id: i64) -> Result<String, String>;
    async fn delete_buyer(&self, buyer_id: i64) -> Result<String, String>;
}

impl CatalogService for ApiClient {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, String> {
        self.get_listings().await
    }

    async fn fetch_listing(&self, id: i64) -> Result<Listing, String> {
        self.get_listing(id).await
    }
}

impl DonorService for ApiClient {
    async fn create_listing(&self, listing: &ValidatedListing) -> Result<String, String> {
        ApiClient::create_listing(self, listing).await
    }

    async fn fetch_seller_listings(&self, seller_id: i64) -> Result<Vec<Listing>, String> {
        self.get_seller_listings(seller_id).await
    }
}

impl AdminService for ApiClient {
    async fn fetch_sellers(&self) -> Result<Vec<Seller>, String> {
        self.get_sellers().await
    }

    async fn fetch_buyers(&self) -> Result<Vec<Buyer>, String> {
        self.get_buyers().await
    }

    async fn approve_seller(&self, seller_id: i64) -> Result<String, String> {
        ApiClient::approve_seller(self, seller_id).await
    }

    async fn reject_seller(&self, seller_id: i64) -> Result<String, String> {
        ApiClient::reject_seller(self, seller_id).await
    }

    async fn delete_seller(&self, seller_id: i64) -> Result<String, String> {
        ApiClient::delete_seller(self, seller_id).await
    }

    async fn delete_buyer(&self, buyer_id: i64) -> Result<String, String> {
        ApiClient::delete_buyer(self, buyer_id).await
    }
}
