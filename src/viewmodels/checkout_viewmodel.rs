// ============================================================================
// CHECKOUT VIEWMODEL - Cart summary and mock payment
// ============================================================================
// No payment provider: the buyer pays out of band and confirms, which
// clears the cart.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::config::{PaymentConfig, CONFIG};
use crate::models::cart::CartItem;
use crate::models::notice::Notice;
use crate::state::cart_state::CartStore;
use crate::utils::clock::Clock;
use crate::utils::storage::KeyValueStorage;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Upi,
    Cash,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub cost: f64,
    pub quantity: u32,
    pub line_total: f64,
}

impl From<&CartItem> for CheckoutLine {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            cost: item.cost,
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub lines: Vec<CheckoutLine>,
    pub subtotal: f64,
    /// No delivery or service fees, so always equal to `subtotal`
    pub total: f64,
}

impl CheckoutSummary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    pub method: PaymentMethod,
    pub title: String,
    /// UPI payee id; absent for cash
    pub payee: Option<String>,
    pub amount: String,
    pub note: String,
}

#[derive(Clone, Debug)]
pub struct CheckoutViewModel {
    payment: PaymentConfig,
    method: PaymentMethod,
}

impl CheckoutViewModel {
    pub fn new() -> Self {
        Self::with_payment_config(CONFIG.payment.clone())
    }

    pub fn with_payment_config(payment: PaymentConfig) -> Self {
        Self {
            payment,
            method: PaymentMethod::default(),
        }
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.method
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.method = method;
    }

    pub fn summary<S: KeyValueStorage, C: Clock>(&self, store: &CartStore<S, C>) -> CheckoutSummary {
        let lines: Vec<CheckoutLine> = store.items().iter().map(CheckoutLine::from).collect();
        let subtotal = lines.iter().map(|line| line.line_total).sum();
        CheckoutSummary {
            lines,
            subtotal,
            total: subtotal,
        }
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.payment.currency_symbol, amount)
    }

    pub fn instructions(&self, summary: &CheckoutSummary) -> PaymentInstructions {
        let amount = self.format_amount(summary.total);
        match self.method {
            PaymentMethod::Upi => PaymentInstructions {
                method: PaymentMethod::Upi,
                title: "Pay using your UPI app".to_string(),
                payee: Some(self.payment.upi_id.clone()),
                amount,
                note: format!(
                    "Please pay the above amount to {} using your preferred UPI app, then confirm to complete.",
                    self.payment.payee_name
                ),
            },
            PaymentMethod::Cash => PaymentInstructions {
                method: PaymentMethod::Cash,
                title: "Pay in cash at pickup".to_string(),
                payee: None,
                amount,
                note: "Please keep the exact amount ready when you collect your items, then confirm to complete."
                    .to_string(),
            },
        }
    }

    /// Marks the order paid. Only local state changes.
    pub fn confirm<S: KeyValueStorage, C: Clock>(&self, store: &CartStore<S, C>) -> Result<Notice, String> {
        let summary = self.summary(store);
        if summary.is_empty() {
            return Err("Your cart is empty".to_string());
        }

        store.clear().map_err(|e| e.to_string())?;
        log::info!(
            "💳 [CHECKOUT] {:?} payment of {} confirmed for {} items",
            self.method,
            self.format_amount(summary.total),
            summary.lines.len()
        );
        Ok(Notice::success(
            "Payment successful! Thank you for supporting food rescue.",
        ))
    }
}

impl Default for CheckoutViewModel {
    fn default() -> Self {
        Self::new()
    }
}
