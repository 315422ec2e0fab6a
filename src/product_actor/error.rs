use http::StatusCode;
use thiserror::Error;

use crate::error::HttpStatus;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Product already exists: {0}")]
    AlreadyExists(String),
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Product is not available: {0}")]
    Inactive(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

crate::impl_from_framework_error!(ProductError);

impl HttpStatus for ProductError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::InsufficientStock { .. } | Self::Inactive(_) => StatusCode::CONFLICT,
            Self::InvalidQuantity(_) | Self::UnknownCategory(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ActorCommunicationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
