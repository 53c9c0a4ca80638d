//! # Register Configuration
//!
//! Store identity, currency display and checkout defaults.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_STORE_NAME="Corner Shop"                                     │
//! │     TALLY_TAX_RATE=7.5                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/register.toml (Linux)                          │
//! │     ~/Library/Application Support/com.tally.pos/register.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no tax, percentage discounts, cash, "Walk-in Customer"             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [store]
//! name = "Corner Shop"
//! currency_symbol = "৳"
//! currency_decimals = 2
//!
//! [checkout]
//! default_tax_rate_percent = 5.0
//! default_discount_type = "PERCENTAGE"
//! default_payment_method = "CASH"
//! walk_in_customer_name = "Walk-in Customer"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tally_core::display::format_money;
use tally_core::{CheckoutParameters, DiscountType, PaymentMethod, DEFAULT_WALK_IN_CUSTOMER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid register configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Printed at the top of every receipt.
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Decimal places shown for money.
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u32,
}

fn default_store_name() -> String {
    "Tally Store".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u32 {
    2
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
        }
    }
}

impl StoreSettings {
    /// Formats an amount in the store's currency.
    pub fn format_currency(&self, amount: f64) -> String {
        format_money(amount, &self.currency_symbol, self.currency_decimals)
    }
}

// =============================================================================
// Checkout Defaults
// =============================================================================

/// Values the checkout dialog starts with, and resets to after each sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDefaults {
    #[serde(default)]
    pub default_tax_rate_percent: f64,

    #[serde(default)]
    pub default_discount_type: DiscountType,

    #[serde(default)]
    pub default_payment_method: PaymentMethod,

    /// Recorded as the customer when none is entered.
    #[serde(default = "default_walk_in_name")]
    pub walk_in_customer_name: String,
}

fn default_walk_in_name() -> String {
    DEFAULT_WALK_IN_CUSTOMER.to_string()
}

impl Default for CheckoutDefaults {
    fn default() -> Self {
        CheckoutDefaults {
            default_tax_rate_percent: 0.0,
            default_discount_type: DiscountType::default(),
            default_payment_method: PaymentMethod::default(),
            walk_in_customer_name: default_walk_in_name(),
        }
    }
}

impl CheckoutDefaults {
    /// Fresh checkout parameters for a new sale.
    pub fn parameters(&self) -> CheckoutParameters {
        CheckoutParameters {
            discount_type: self.default_discount_type,
            tax_rate_percent: self.default_tax_rate_percent,
            payment_method: self.default_payment_method,
            ..CheckoutParameters::default()
        }
    }
}

// =============================================================================
// Register Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub checkout: CheckoutDefaults,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (register.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.checkout.default_tax_rate_percent;
        if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "default_tax_rate_percent must be between 0 and 100, got {}",
                rate
            )));
        }

        if self.checkout.walk_in_customer_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "walk_in_customer_name must not be blank".into(),
            ));
        }

        if self.store.currency_decimals > 4 {
            return Err(ConfigError::Invalid(format!(
                "currency_decimals must be at most 4, got {}",
                self.store.currency_decimals
            )));
        }

        Ok(())
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("TALLY_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        if let Some(symbol) = lookup("TALLY_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        if let Some(rate) = lookup("TALLY_TAX_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => {
                    debug!(tax_rate = r, "Overriding tax rate from environment");
                    self.checkout.default_tax_rate_percent = r;
                }
                Err(_) => warn!(tax_rate = %rate, "Invalid tax rate in environment"),
            }
        }

        if let Some(method) = lookup("TALLY_PAYMENT_METHOD") {
            match method.parse::<PaymentMethod>() {
                Ok(m) => self.checkout.default_payment_method = m,
                Err(e) => warn!("{}", e),
            }
        }

        if let Some(name) = lookup("TALLY_WALK_IN_NAME") {
            self.checkout.walk_in_customer_name = name;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert_eq!(config.store.currency_symbol, "$");
        assert_eq!(config.checkout.walk_in_customer_name, "Walk-in Customer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: RegisterConfig = toml::from_str(
            r#"
            [store]
            name = "Corner Shop"
            currency_symbol = "৳"

            [checkout]
            default_tax_rate_percent = 5.0
            default_payment_method = "MOBILE_BANKING"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Corner Shop");
        assert_eq!(config.store.currency_decimals, 2);
        assert_eq!(config.checkout.default_payment_method, PaymentMethod::MobileBanking);
        assert_eq!(config.checkout.default_discount_type, DiscountType::Percentage);
        assert_eq!(config.checkout.walk_in_customer_name, "Walk-in Customer");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TALLY_STORE_NAME", "Night Market"),
            ("TALLY_TAX_RATE", "7.5"),
            ("TALLY_PAYMENT_METHOD", "card"),
            ("TALLY_WALK_IN_NAME", "Guest"),
        ]
        .into_iter()
        .collect();

        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.name, "Night Market");
        assert_eq!(config.checkout.default_tax_rate_percent, 7.5);
        assert_eq!(config.checkout.default_payment_method, PaymentMethod::Card);
        assert_eq!(config.checkout.walk_in_customer_name, "Guest");
    }

    #[test]
    fn test_bad_override_ignored() {
        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| match key {
            "TALLY_TAX_RATE" => Some("lots".to_string()),
            "TALLY_PAYMENT_METHOD" => Some("cheque".to_string()),
            _ => None,
        });
        assert_eq!(config.checkout.default_tax_rate_percent, 0.0);
        assert_eq!(config.checkout.default_payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_validation() {
        let mut config = RegisterConfig::default();
        config.checkout.default_tax_rate_percent = 120.0;
        assert!(config.validate().is_err());

        config.checkout.default_tax_rate_percent = 5.0;
        config.checkout.walk_in_customer_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_to_parameters() {
        let defaults = CheckoutDefaults {
            default_tax_rate_percent: 5.0,
            default_payment_method: PaymentMethod::Card,
            ..CheckoutDefaults::default()
        };
        let params = defaults.parameters();
        assert_eq!(params.tax_rate_percent, 5.0);
        assert_eq!(params.payment_method, PaymentMethod::Card);
        assert_eq!(params.received_amount, 0.0);
        assert!(params.customer_name.is_none());
    }

    #[test]
    fn test_format_currency() {
        let store = StoreSettings::default();
        assert_eq!(store.format_currency(945.0), "$945.00");
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&RegisterConfig::default()).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[checkout]"));
    }
}
