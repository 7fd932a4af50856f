use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A donor-submitted food item, as served by `/product/*`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price, but donors also use it as weight/quantity
    #[serde(default, deserialize_with = "lenient_number")]
    pub cost: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Time-to-live in minutes
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub timer: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Active,
    Expired,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotatedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub status: ListingStatus,
}

impl Listing {
    /// Positive time-to-live in minutes; zero or negative timers never expire.
    pub fn ttl_minutes(&self) -> Option<i64> {
        self.timer.filter(|minutes| *minutes > 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let created_at = self.created_at?;
        let minutes = self.ttl_minutes()?;
        created_at.checked_add_signed(Duration::try_minutes(minutes)?)
    }

    /// Strictly after the expiry instant. Listings without a creation time or
    /// a timer never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> ListingStatus {
        if self.is_expired(now) {
            ListingStatus::Expired
        } else {
            ListingStatus::Active
        }
    }

    /// Time left before expiry, clamped at zero. `None` for non-expiring listings.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let expires_at = self.expires_at()?;
        Some((expires_at - now).max(Duration::zero()))
    }

    pub fn annotate(&self, now: DateTime<Utc>) -> AnnotatedListing {
        AnnotatedListing {
            listing: self.clone(),
            status: self.status(now),
        }
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&query))
                .unwrap_or(false)
    }
}

/// Accepts RFC 3339, a zone-less `LocalDateTime` string or Jackson's array
/// form `[y, m, d, h, min, s, nanos]`; zone-less values are browser local time. Anything else becomes
/// `None` so one bad row doesn't sink the whole catalog.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Array(parts)) => timestamp_from_parts(&parts),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Integer, whole float or numeric string; anything else means no timer.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole_minutes)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_minutes))
        }
        _ => None,
    })
}

fn whole_minutes(value: f64) -> Option<i64> {
    let fits = value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64;
    fits.then_some(value as i64)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(from_local)
}

/// Spring's `LocalDateTime` carries no zone; read it the way the browser's
/// `Date` would, in the local zone. A wall time skipped by a DST jump takes
/// the offset in force just before it.
fn from_local(naive: NaiveDateTime) -> DateTime<Utc> {
    let offset = Local
        .offset_from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.offset_from_utc_datetime(&naive));
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    (naive - shift).and_utc()
}

fn timestamp_from_parts(parts: &[Value]) -> Option<DateTime<Utc>> {
    let field = |i: usize| parts.get(i).and_then(Value::as_i64).unwrap_or(0);
    if parts.len() < 3 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(field(0)).ok()?,
        u32::try_from(field(1)).ok()?,
        u32::try_from(field(2)).ok()?,
    )?;
    let naive = date.and_hms_nano_opt(
        u32::try_from(field(3)).ok()?,
        u32::try_from(field(4)).ok()?,
        u32::try_from(field(5)).ok()?,
        u32::try_from(field(6)).ok()?,
    )?;
    Some(from_local(naive))
}

// ----------------------------------------------------------------------------
// Donor submission
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Form payload for `POST /product/addproduct`. Numbers stay as typed
/// until `validate`. The image is attached separately, never from JSON.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewListing {
    pub seller_id: Option<i64>,
    pub name: String,
    pub category: String,
    pub description: String,
    pub cost: String,
    pub timer_minutes: String,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ListingFormError {
    #[error("Seller not logged in.")]
    NotLoggedIn,
    #[error("Please enter a name.")]
    MissingName,
    #[error("Please choose a category.")]
    MissingCategory,
    #[error("Please enter a valid quantity.")]
    InvalidCost,
    #[error("Please set a valid timer (in minutes).")]
    InvalidTimer,
}

/// A form that passed validation, with numbers parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedListing {
    pub seller_id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub cost: f64,
    pub timer_minutes: i64,
    pub image: Option<ImageUpload>,
}

impl NewListing {
    pub fn validate(&self) -> Result<ValidatedListing, ListingFormError> {
        let seller_id = self.seller_id.ok_or(ListingFormError::NotLoggedIn)?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(ListingFormError::MissingName);
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(ListingFormError::MissingCategory);
        }

        let cost = self
            .cost
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|c| c.is_finite() && *c >= 0.0)
            .ok_or(ListingFormError::InvalidCost)?;

        let timer_minutes = self
            .timer_minutes
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|t| *t > 0)
            .ok_or(ListingFormError::InvalidTimer)?;

        Ok(ValidatedListing {
            seller_id,
            name: name.to_string(),
            category: category.to_string(),
            description: self.description.trim().to_string(),
            cost,
            timer_minutes,
            image: self.image.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn listing(created_at: Option<DateTime<Utc>>, timer: Option<i64>) -> Listing {
        Listing {
            id: 1,
            name: "Rice".to_string(),
            category: "Grains".to_string(),
            description: Some("Cooked basmati".to_string()),
            cost: 5.0,
            created_at,
            timer,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn active_up_to_and_including_expiry_instant() {
        let l = listing(Some(t0()), Some(30));
        let expiry = t0() + Duration::minutes(30);

        assert!(!l.is_expired(t0()));
        assert!(!l.is_expired(expiry - Duration::milliseconds(1)));
        assert!(!l.is_expired(expiry));
        assert!(l.is_expired(expiry + Duration::milliseconds(1)));
        assert!(l.is_expired(expiry + Duration::days(3)));
    }

    #[test]
    fn missing_fields_never_expire() {
        let far_future = t0() + Duration::days(10_000);
        assert!(!listing(None, Some(30)).is_expired(far_future));
        assert!(!listing(Some(t0()), None).is_expired(far_future));
        assert!(!listing(None, None).is_expired(far_future));
        assert!(!listing(Some(t0()), Some(0)).is_expired(far_future));
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let l = listing(Some(t0()), Some(10));
        assert_eq!(l.remaining(t0()), Some(Duration::minutes(10)));
        assert_eq!(l.remaining(t0() + Duration::hours(1)), Some(Duration::zero()));
        assert_eq!(listing(None, Some(10)).remaining(t0()), None);
    }

    /// Noon on 2025-03-01 on the machine's wall clock.
    fn local_noon() -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn deserializes_backend_shapes() {
        let json = r#"[
            {"id": 7, "name": "Bread", "category": "Bakery", "description": null,
             "cost": 12.5, "createdAt": "2025-03-01T12:00:00", "timer": 45, "seller": {"id": 3}},
            {"id": 8, "name": "Soup", "cost": 3, "createdAt": "2025-03-01T12:00:00Z"},
            {"id": 9, "name": "Milk", "createdAt": "yesterday", "timer": "soon"},
            {"id": 10, "name": "Curd", "cost": "2.5", "createdAt": [2025, 3, 1, 12, 0], "timer": "30"},
            {"id": 11, "name": "Idli", "createdAt": "2025-03-01T12:00:00+05:30", "timer": 30.0},
            {"id": 12, "name": "Poha", "timer": 2.5}
        ]"#;
        let listings: Vec<Listing> = serde_json::from_str(json).unwrap();

        assert_eq!(listings.len(), 6);
        assert_eq!(listings[0].created_at, Some(local_noon()));
        assert_eq!(listings[0].timer, Some(45));
        assert_eq!(listings[1].created_at, Some(t0()));
        assert_eq!(listings[1].timer, None);
        assert_eq!(listings[2].created_at, None);
        assert_eq!(listings[2].cost, 0.0);
        assert_eq!(listings[2].timer, None);
        assert_eq!(listings[3].created_at, Some(local_noon()));
        assert_eq!(listings[3].cost, 2.5);
        assert_eq!(listings[3].timer, Some(30));
        assert_eq!(listings[4].created_at, Some(t0() - Duration::minutes(330)));
        assert_eq!(listings[4].timer, Some(30));
        assert_eq!(listings[5].timer, None);
    }

    #[test]
    fn zone_less_timestamp_is_local_wall_time() {
        let parsed = parse_timestamp("2025-03-01T12:00:00").unwrap();
        let wall = parsed.with_timezone(&Local).naive_local();
        assert_eq!(wall.to_string(), "2025-03-01 12:00:00");
    }

    #[test]
    fn query_matches_name_or_description() {
        let l = listing(None, None);
        assert!(l.matches_query("rice"));
        assert!(l.matches_query("BASMATI"));
        assert!(l.matches_query("  "));
        assert!(!l.matches_query("bread"));
    }

    #[test]
    fn form_validation() {
        let mut form = NewListing {
            seller_id: Some(3),
            name: " Dal ".to_string(),
            category: "Cooked".to_string(),
            description: String::new(),
            cost: "4".to_string(),
            timer_minutes: "0".to_string(),
            image: None,
        };
        assert_eq!(form.validate(), Err(ListingFormError::InvalidTimer));

        form.timer_minutes = "abc".to_string();
        assert_eq!(form.validate(), Err(ListingFormError::InvalidTimer));

        form.timer_minutes = "90".to_string();
        let valid = form.validate().unwrap();
        assert_eq!(valid.name, "Dal");
        assert_eq!(valid.timer_minutes, 90);
        assert_eq!(valid.cost, 4.0);

        form.cost = "-1".to_string();
        assert_eq!(form.validate(), Err(ListingFormError::InvalidCost));

        form.seller_id = None;
        assert_eq!(form.validate(), Err(ListingFormError::NotLoggedIn));
    }
}
