// ============================================================================
// DONOR VIEWMODEL - Listing submission, countdown, seller stats
// ============================================================================
// State sits behind interior mutability so the app can hold an `Rc` of the
// view-model across awaits without a long-lived `RefCell` borrow.
// ============================================================================

use std::cell::RefCell;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::listing::{Listing, NewListing};
use crate::services::catalog_service::DonorService;
use crate::utils::clock::Clock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub donation_count: usize,
    /// Listings carrying a positive timer (auto-expiring)
    pub timer_donations: usize,
}

pub fn seller_stats(listings: &[Listing]) -> SellerStats {
    SellerStats {
        donation_count: listings.len(),
        timer_donations: listings.iter().filter(|l| l.ttl_minutes().is_some()).count(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Countdown {
    started_at: DateTime<Utc>,
    seconds: i64,
}

#[derive(Debug, Default)]
struct DonorState {
    message: Option<String>,
    error: Option<String>,
    countdown: Option<Countdown>,
    submitting: bool,
}

pub struct DonorViewModel<A: DonorService, C: Clock> {
    service: A,
    clock: C,
    state: RefCell<DonorState>,
}

impl<A: DonorService, C: Clock> DonorViewModel<A, C> {
    pub fn new(service: A, clock: C) -> Self {
        Self {
            service,
            clock,
            state: RefCell::new(DonorState::default()),
        }
    }

    /// Validates, then uploads. On success the server message is kept and a
    /// countdown of the listing's timer starts.
    pub async fn submit(&self, form: NewListing) -> Result<String, String> {
        let listing = match form.validate() {
            Ok(listing) => listing,
            Err(e) => {
                log::warn!("⚠️ [DONOR] Invalid listing form: {}", e);
                let mut state = self.state.borrow_mut();
                state.message = None;
                state.error = Some(e.to_string());
                return Err(e.to_string());
            }
        };

        self.state.borrow_mut().submitting = true;
        let result = self.service.create_listing(&listing).await;

        let mut state = self.state.borrow_mut();
        state.submitting = false;
        match result {
            Ok(message) => {
                log::info!("✅ [DONOR] Listing '{}' created", listing.name);
                state.message = Some(message.clone());
                state.error = None;
                state.countdown = Some(Countdown {
                    started_at: self.clock.now(),
                    seconds: listing.timer_minutes.saturating_mul(60),
                });
                Ok(message)
            }
            Err(e) => {
                log::error!("❌ [DONOR] Failed to create listing: {}", e);
                let message = if e.trim().is_empty() {
                    "An unexpected error occurred.".to_string()
                } else {
                    e
                };
                state.message = None;
                state.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Whole seconds left on the last submission's countdown. `None` when no
    /// countdown is running or it has run out.
    pub fn countdown_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let countdown = self.state.borrow().countdown?;
        let ends_at = countdown
            .started_at
            .checked_add_signed(Duration::try_seconds(countdown.seconds)?)?;
        let left = (ends_at - now).num_seconds();
        (left > 0).then_some(left)
    }

    /// Advances the countdown to now; once it runs out the success message
    /// is cleared too. Returns the seconds left.
    pub fn tick(&self) -> Option<i64> {
        let remaining = self.countdown_remaining(self.clock.now());
        if remaining.is_none() {
            let mut state = self.state.borrow_mut();
            if state.countdown.take().is_some() {
                state.message = None;
            }
        }
        remaining
    }

    pub async fn load_stats(&self, seller_id: i64) -> Result<SellerStats, String> {
        match self.service.fetch_seller_listings(seller_id).await {
            Ok(listings) => Ok(seller_stats(&listings)),
            Err(e) => {
                log::error!("❌ [DONOR] Failed to fetch listings for seller {}: {}", seller_id, e);
                Err(e)
            }
        }
    }

    pub fn message(&self) -> Option<String> {
        self.state.borrow().message.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.borrow().submitting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::ValidatedListing;
    use crate::utils::clock::FixedClock;
    use chrono::TimeZone;
    use futures::executor::block_on;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeDonor {
        created: RefCell<Vec<ValidatedListing>>,
        fail_with: Option<String>,
        listings: Vec<Listing>,
    }

    impl DonorService for FakeDonor {
        async fn create_listing(&self, listing: &ValidatedListing) -> Result<String, String> {
            if let Some(e) = &self.fail_with {
                return Err(e.clone());
            }
            self.created.borrow_mut().push(listing.clone());
            Ok("Product Added Successfully".to_string())
        }

        async fn fetch_seller_listings(&self, _seller_id: i64) -> Result<Vec<Listing>, String> {
            Ok(self.listings.clone())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn form(timer: &str) -> NewListing {
        NewListing {
            seller_id: Some(7),
            name: "Chapati".to_string(),
            category: "Cooked".to_string(),
            description: "Leftover from lunch".to_string(),
            cost: "2".to_string(),
            timer_minutes: timer.to_string(),
            image: None,
        }
    }

    #[test]
    fn successful_submit_starts_countdown() {
        let clock = Rc::new(FixedClock::new(t0()));
        let vm = DonorViewModel::new(FakeDonor::default(), clock.clone());

        let message = block_on(vm.submit(form("2"))).unwrap();
        assert_eq!(message, "Product Added Successfully");
        assert_eq!(vm.service.created.borrow().len(), 1);
        assert_eq!(vm.countdown_remaining(t0()), Some(120));

        clock.advance(Duration::seconds(90));
        assert_eq!(vm.tick(), Some(30));
        assert!(vm.message().is_some());

        clock.advance(Duration::seconds(30));
        assert_eq!(vm.tick(), None);
        assert!(vm.message().is_none());
    }

    #[test]
    fn invalid_timer_never_reaches_service() {
        let vm = DonorViewModel::new(FakeDonor::default(), FixedClock::new(t0()));
        let err = block_on(vm.submit(form("0"))).unwrap_err();
        assert_eq!(err, "Please set a valid timer (in minutes).");
        assert_eq!(vm.error().as_deref(), Some(err.as_str()));
        assert!(vm.service.created.borrow().is_empty());
        assert_eq!(vm.countdown_remaining(t0()), None);
    }

    #[test]
    fn failed_upload_keeps_error() {
        let service = FakeDonor {
            fail_with: Some("HTTP 500: Internal Server Error".to_string()),
            ..FakeDonor::default()
        };
        let vm = DonorViewModel::new(service, FixedClock::new(t0()));
        assert!(block_on(vm.submit(form("5"))).is_err());
        assert_eq!(vm.error().as_deref(), Some("HTTP 500: Internal Server Error"));
        assert!(!vm.is_submitting());
        assert_eq!(vm.countdown_remaining(t0()), None);
    }

    #[test]
    fn stats_count_timed_donations() {
        let listing = |id: i64, timer: Option<i64>| Listing {
            id,
            name: "Rice".to_string(),
            category: "Cooked".to_string(),
            description: None,
            cost: 1.0,
            created_at: None,
            timer,
        };
        let service = FakeDonor {
            listings: vec![listing(1, Some(30)), listing(2, None), listing(3, Some(0))],
            ..FakeDonor::default()
        };
        let vm = DonorViewModel::new(service, FixedClock::new(t0()));
        let stats = block_on(vm.load_stats(7)).unwrap();
        assert_eq!(stats, SellerStats { donation_count: 3, timer_donations: 1 });
    }
}
