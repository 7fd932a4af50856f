use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::listing::Listing;

/// One cart entry, persisted under `cartItems`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Listing id (not owned by the cart)
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Snapshot of the listing cost when added
    pub cost: f64,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_listing(listing: &Listing, added_at: DateTime<Utc>) -> Self {
        Self {
            id: listing.id,
            name: listing.name.clone(),
            category: listing.category.clone(),
            cost: listing.cost,
            quantity: 1,
            added_at,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.cost * f64::from(self.quantity)
    }
}

/// One collection-list entry, persisted under `collectItems`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// The listing's cost field, read as an amount of food
    pub quantity: f64,
    pub added_at: DateTime<Utc>,
}

impl CollectItem {
    pub fn from_listing(listing: &Listing, added_at: DateTime<Utc>) -> Self {
        Self {
            id: listing.id,
            name: listing.name.clone(),
            category: listing.category.clone(),
            quantity: listing.cost,
            added_at,
        }
    }
}

/// Change notifications emitted by the cart store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CartEvent {
    #[serde(rename_all = "camelCase")]
    CartChanged { cart_count: usize },
    #[serde(rename_all = "camelCase")]
    CollectChanged { collect_count: usize },
}

/// What happened to each list on a combined "add to collection".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectOutcome {
    pub collected: Addition,
    pub carted: Addition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Addition {
    Added,
    AlreadyPresent,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_shape_is_camel_case() {
        let item = CartItem {
            id: 4,
            name: "Apples".to_string(),
            category: "Fruit".to_string(),
            cost: 2.5,
            quantity: 3,
            added_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["addedAt"], "2025-01-02T03:04:05Z");
        assert_eq!(json["quantity"], 3);
        assert_eq!(item.line_total(), 7.5);
    }

    #[test]
    fn reads_items_written_by_the_web_client() {
        let raw = r#"[{"id":1,"name":"Rice","category":"Grains","cost":50,"quantity":2,"addedAt":"2025-04-01T09:30:00.000Z"}]"#;
        let items: Vec<CartItem> = serde_json::from_str(raw).unwrap();
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].cost, 50.0);
    }
}
