//! Crate-level error type and its HTTP status mapping.
//!
//! Each resource has its own error enum next to its actor; `StoreError`
//! wraps them so callers that span several resources have one type to
//! propagate with `?`.

use http::StatusCode;
use thiserror::Error;

use crate::cart_actor::CartError;
use crate::category_actor::CategoryError;
use crate::config::ConfigError;
use crate::order_actor::OrderError;
use crate::payment_actor::PaymentError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;
use crate::validation::ValidationErrors;
use crate::webhooks::WebhookError;

/// The HTTP status a controller should answer with for an error.
pub trait HttpStatus {
    fn status_code(&self) -> StatusCode;
}

impl HttpStatus for ValidationErrors {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl HttpStatus for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::User(e) => e.status_code(),
            Self::Category(e) => e.status_code(),
            Self::Product(e) => e.status_code(),
            Self::Cart(e) => e.status_code(),
            Self::Order(e) => e.status_code(),
            Self::Payment(e) => e.status_code(),
            Self::Webhook(e) => e.status_code(),
            Self::Validation(e) => e.status_code(),
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StoreError {
    /// Field-level messages when the failure was a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(e) => Some(e),
            Self::User(UserError::Validation(e))
            | Self::Category(CategoryError::Validation(e))
            | Self::Product(ProductError::Validation(e))
            | Self::Cart(CartError::Validation(e))
            | Self::Order(OrderError::Validation(e))
            | Self::Payment(PaymentError::Validation(e)) => Some(e),
            _ => None,
        }
    }
}
