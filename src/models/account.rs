use serde::{Deserialize, Deserializer, Serialize};

/// Donor account as listed by `/admin/viewallsellers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub mobileno: Option<String>,
    #[serde(default)]
    pub nationalidno: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: SellerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SellerStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

// Backend sends free text; anything unrecognised is still awaiting review.
impl<'de> Deserialize<'de> for SellerStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("approved") => SellerStatus::Approved,
            Some(s) if s.eq_ignore_ascii_case("rejected") => SellerStatus::Rejected,
            _ => SellerStatus::Pending,
        })
    }
}

/// Recipient account as listed by `/admin/viewallbuyers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobileno: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_status_is_lenient() {
        let sellers: Vec<Seller> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "A", "status": "Approved"},
                {"id": 2, "name": "B", "status": "REJECTED"},
                {"id": 3, "name": "C", "status": "Pending"},
                {"id": 4, "name": "D", "status": null},
                {"id": 5, "name": "E"}
            ]"#,
        )
        .unwrap();

        let statuses: Vec<SellerStatus> = sellers.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                SellerStatus::Approved,
                SellerStatus::Rejected,
                SellerStatus::Pending,
                SellerStatus::Pending,
                SellerStatus::Pending,
            ]
        );
    }
}
