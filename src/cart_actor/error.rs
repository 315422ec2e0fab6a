use http::StatusCode;
use thiserror::Error;

use crate::error::HttpStatus;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error("Cart not found: {0}")]
    NotFound(String),
    #[error("Cart already exists for user: {0}")]
    AlreadyExists(String),
    #[error("Product not in cart: {0}")]
    ItemNotInCart(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("Product is not available: {0}")]
    ProductUnavailable(String),
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

crate::impl_from_framework_error!(CartError);

impl HttpStatus for CartError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::ItemNotInCart(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::ProductUnavailable(_) | Self::InsufficientStock { .. } => {
                StatusCode::CONFLICT
            }
            Self::InvalidQuantity(_) | Self::UnknownUser(_) | Self::UnknownProduct(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ActorCommunicationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
