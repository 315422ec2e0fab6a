use http::StatusCode;
use thiserror::Error;

use crate::cart_actor::CartError;
use crate::domain::OrderStatus;
use crate::error::HttpStatus;
use crate::payment_actor::PaymentError;
use crate::product_actor::ProductError;
use crate::validation::ValidationErrors;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid user: {0}")]
    InvalidUser(String),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Order {0} has no payment")]
    PaymentMissing(String),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

crate::impl_from_framework_error!(OrderError);

impl HttpStatus for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidUser(_) | Self::InvalidProduct(_) | Self::EmptyCart | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::AlreadyExists(_)
            | Self::InsufficientStock { .. }
            | Self::InvalidTransition { .. }
            | Self::PaymentMissing(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Payment(e) => e.status_code(),
            Self::Product(e) => e.status_code(),
            Self::Cart(e) => e.status_code(),
            Self::ActorCommunicationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
