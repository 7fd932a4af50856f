pub mod account;
pub mod cart;
pub mod listing;
pub mod notice;

pub use account::{Buyer, Seller, SellerStatus};
pub use cart::{Addition, CartEvent, CartItem, CollectItem, CollectOutcome};
pub use listing::{AnnotatedListing, ImageUpload, Listing, ListingFormError, ListingStatus, NewListing, ValidatedListing};
pub use notice::{Notice, NoticeLevel};
