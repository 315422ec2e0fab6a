//! Configuration loading for the storefront.
//!
//! Values come from defaults, an optional TOML file and `STOREFRONT_`
//! environment variables, later sources overriding earlier ones. Nested keys
//! use a double underscore: `STOREFRONT_CHECKOUT__TAX_RATE_BPS=825`.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Money, PaymentProvider, PricingPolicy};

const ENV_PREFIX: &str = "STOREFRONT_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),
    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub actors: ActorConfig,
    pub checkout: CheckoutConfig,
    pub payments: PaymentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Mailbox capacity of each resource actor.
    pub buffer_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// ISO 4217 code all prices are expressed in.
    pub currency: String,
    pub tax_rate_bps: u32,
    pub flat_shipping: Money,
    pub free_shipping_threshold: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub providers: Vec<PaymentProvider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self { buffer_size: 32 }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            tax_rate_bps: 0,
            flat_shipping: Money::from_cents(500),
            free_shipping_threshold: Some(Money::from_cents(5_000)),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            providers: vec![PaymentProvider::Stripe, PaymentProvider::PayPal],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CheckoutConfig {
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate_bps: self.tax_rate_bps,
            flat_shipping: self.flat_shipping,
            free_shipping_threshold: self.free_shipping_threshold,
        }
    }
}

impl Config {
    /// Load configuration with an optional TOML file.
    ///
    /// A missing file is not an error; figment skips it.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actors.buffer_size == 0 {
            return Err(ConfigError::Validation {
                message: "actors.buffer_size must be greater than 0".to_string(),
            });
        }
        if self.checkout.tax_rate_bps > 10_000 {
            return Err(ConfigError::Validation {
                message: format!(
                    "checkout.tax_rate_bps ({}) cannot exceed 10000",
                    self.checkout.tax_rate_bps
                ),
            });
        }
        if self.checkout.currency.len() != 3 || !self.checkout.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Validation {
                message: format!("checkout.currency ({}) must be a 3-letter code", self.checkout.currency),
            });
        }
        if self.payments.providers.is_empty() {
            return Err(ConfigError::Validation {
                message: "payments.providers must enable at least one provider".to_string(),
            });
        }
        Ok(())
    }
}
