/// localStorage key holding the cart line items
pub const CART_STORAGE_KEY: &str = "cartItems";

/// localStorage key holding the collection (interest) list
pub const COLLECT_STORAGE_KEY: &str = "collectItems";

pub const MAX_CART_ITEMS: usize = 10;
pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 10;

/// DOM events the navigation bar listens for
pub const CART_UPDATED_EVENT: &str = "cartUpdated";
pub const COLLECT_UPDATED_EVENT: &str = "collectUpdated";
pub const CATALOG_UPDATED_EVENT: &str = "catalogUpdated";

/// Related listings shown under a listing detail
pub const RELATED_LISTINGS_LIMIT: usize = 4;
