use serde::{Deserialize, Serialize};

use crate::utils::constants::{MAX_CART_ITEMS, MAX_QUANTITY, MIN_QUANTITY};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url_development: String,
    pub backend_url_production: String,
    pub environment: String,
    pub enable_logging: bool,
    /// How often the catalog re-evaluates expiry without refetching.
    pub expiry_refresh_seconds: u32,
    pub cart: CartConfig,
    pub payment: PaymentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url_development: "http://localhost:2025".to_string(),
            backend_url_production: "https://api.foodrescue.example".to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            expiry_refresh_seconds: 30,
            cart: CartConfig::default(),
            payment: PaymentConfig::default(),
        }
    }
}

/// Cart bounds. Line items are capped at `max_items`; quantities are
/// clamped into `min_quantity..=max_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    pub max_items: usize,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            max_items: MAX_CART_ITEMS,
            min_quantity: MIN_QUANTITY,
            max_quantity: MAX_QUANTITY,
        }
    }
}

impl CartConfig {
    pub fn clamp_quantity(&self, requested: i64) -> u32 {
        requested.clamp(self.min_quantity as i64, self.max_quantity as i64) as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub upi_id: String,
    pub payee_name: String,
    pub currency_symbol: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            upi_id: "foodrescue@bank".to_string(),
            payee_name: "Food Rescue".to_string(),
            currency_symbol: "₹".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from compile-time environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_url_development: option_env!("BACKEND_URL_DEVELOPMENT")
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_development),
            backend_url_production: option_env!("BACKEND_URL_PRODUCTION")
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_production),
            environment: option_env!("ENVIRONMENT")
                .map(str::to_string)
                .unwrap_or(defaults.environment),
            enable_logging: option_env!("ENABLE_LOGGING")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_logging),
            expiry_refresh_seconds: option_env!("EXPIRY_REFRESH_SECONDS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.expiry_refresh_seconds),
            cart: CartConfig::default(),
            payment: PaymentConfig {
                upi_id: option_env!("UPI_ID")
                    .map(str::to_string)
                    .unwrap_or(defaults.payment.upi_id),
                payee_name: option_env!("PAYEE_NAME")
                    .map(str::to_string)
                    .unwrap_or(defaults.payment.payee_name),
                currency_symbol: defaults.payment.currency_symbol,
            },
        }
    }

    /// Backend URL for the current environment
    pub fn backend_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.backend_url_production,
            _ => &self.backend_url_development,
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_url_follows_environment() {
        let mut config = AppConfig::default();
        assert_eq!(config.backend_url(), "http://localhost:2025");

        config.environment = "production".to_string();
        assert_eq!(config.backend_url(), "https://api.foodrescue.example");
    }

    #[test]
    fn clamp_quantity_bounds() {
        let cart = CartConfig::default();
        assert_eq!(cart.clamp_quantity(0), 1);
        assert_eq!(cart.clamp_quantity(-5), 1);
        assert_eq!(cart.clamp_quantity(7), 7);
        assert_eq!(cart.clamp_quantity(999), 10);
    }
}
