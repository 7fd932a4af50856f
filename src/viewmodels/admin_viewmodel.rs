// ============================================================================
// ADMIN VIEWMODEL - Seller approval and account removal
// ============================================================================

use std::cell::RefCell;

use serde::Serialize;

use crate::models::account::{Buyer, Seller, SellerStatus};
use crate::services::catalog_service::AdminService;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AdminCounts {
    pub sellers: usize,
    pub buyers: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Default)]
struct AdminState {
    sellers: Vec<Seller>,
    buyers: Vec<Buyer>,
    error: Option<String>,
}

pub struct AdminViewModel<A: AdminService> {
    service: A,
    state: RefCell<AdminState>,
}

impl<A: AdminService> AdminViewModel<A> {
    pub fn new(service: A) -> Self {
        Self {
            service,
            state: RefCell::new(AdminState::default()),
        }
    }

    /// Fetches both account lists. A failed list keeps its previous rows.
    pub async fn load(&self) -> Result<(), String> {
        let sellers = self.refresh_sellers().await;
        let buyers = match self.service.fetch_buyers().await {
            Ok(buyers) => {
                self.state.borrow_mut().buyers = buyers;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to fetch buyers data...", &e)),
        };
        sellers.and(buyers)
    }

    pub async fn approve_seller(&self, seller_id: i64) -> Result<String, String> {
        match self.service.approve_seller(seller_id).await {
            Ok(message) => {
                // The change landed; a failed refetch only shows inline.
                if let Err(e) = self.refresh_sellers().await {
                    log::warn!("⚠️ [ADMIN] Seller {} updated, list is stale: {}", seller_id, e);
                }
                Ok(message)
            }
            Err(e) => Err(self.fail("Approval failed...", &e)),
        }
    }

    pub async fn reject_seller(&self, seller_id: i64) -> Result<String, String> {
        match self.service.reject_seller(seller_id).await {
            Ok(message) => {
                // The change landed; a failed refetch only shows inline.
                if let Err(e) = self.refresh_sellers().await {
                    log::warn!("⚠️ [ADMIN] Seller {} updated, list is stale: {}", seller_id, e);
                }
                Ok(message)
            }
            Err(e) => Err(self.fail("Rejection failed...", &e)),
        }
    }

    pub async fn delete_seller(&self, seller_id: i64) -> Result<String, String> {
        match self.service.delete_seller(seller_id).await {
            Ok(message) => {
                let mut state = self.state.borrow_mut();
                state.sellers.retain(|s| s.id != seller_id);
                state.error = None;
                Ok(message)
            }
            Err(e) => Err(self.fail("Deletion failed...", &e)),
        }
    }

    pub async fn delete_buyer(&self, buyer_id: i64) -> Result<String, String> {
        match self.service.delete_buyer(buyer_id).await {
            Ok(message) => {
                let mut state = self.state.borrow_mut();
                state.buyers.retain(|b| b.id != buyer_id);
                state.error = None;
                Ok(message)
            }
            Err(e) => Err(self.fail("Deletion failed...", &e)),
        }
    }

    pub fn sellers(&self) -> Vec<Seller> {
        self.state.borrow().sellers.clone()
    }

    pub fn buyers(&self) -> Vec<Buyer> {
        self.state.borrow().buyers.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn counts(&self) -> AdminCounts {
        let state = self.state.borrow();
        let with_status = |status: SellerStatus| state.sellers.iter().filter(|s| s.status == status).count();
        AdminCounts {
            sellers: state.sellers.len(),
            buyers: state.buyers.len(),
            pending: with_status(SellerStatus::Pending),
            approved: with_status(SellerStatus::Approved),
            rejected: with_status(SellerStatus::Rejected),
        }
    }

    async fn refresh_sellers(&self) -> Result<(), String> {
        match self.service.fetch_sellers().await {
            Ok(sellers) => {
                let mut state = self.state.borrow_mut();
                state.sellers = sellers;
                state.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to fetch sellers data...", &e)),
        }
    }

    fn fail(&self, context: &str, error: &str) -> String {
        let message = format!("{} {}", context, error);
        log::error!("❌ [ADMIN] {}", message);
        self.state.borrow_mut().error = Some(message.clone());
        message
    }
}
