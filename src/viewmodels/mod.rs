pub mod admin_viewmodel;
pub mod catalog_viewmodel;
pub mod checkout_viewmodel;
pub mod donor_viewmodel;

pub use admin_viewmodel::{AdminCounts, AdminViewModel};
pub use catalog_viewmodel::{CatalogFilter, CatalogStats, CatalogViewModel, SortOrder};
pub use checkout_viewmodel::{CheckoutSummary, CheckoutViewModel, PaymentInstructions, PaymentMethod};
pub use donor_viewmodel::{seller_stats, DonorViewModel, SellerStats};
