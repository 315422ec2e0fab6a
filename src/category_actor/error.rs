use http::StatusCode;
use thiserror::Error;

use crate::error::HttpStatus;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CategoryError {
    #[error("Category not found: {0}")]
    NotFound(String),
    #[error("Category already exists: {0}")]
    AlreadyExists(String),
    #[error("Category {id} still has {products} product(s)")]
    InUse { id: String, products: usize },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

crate::impl_from_framework_error!(CategoryError);

impl HttpStatus for CategoryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::InUse { .. } => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ActorCommunicationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
