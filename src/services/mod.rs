pub mod api_client;
pub mod catalog_service;

pub use api_client::ApiClient;
pub use catalog_service::{AdminService, CatalogService, DonorService};
