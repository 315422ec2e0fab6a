use http::StatusCode;
use thiserror::Error;

use crate::domain::{Money, PaymentProvider, PaymentStatus};
use crate::error::HttpStatus;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Payment not found: {0}")]
    NotFound(String),
    #[error("Payment already exists for order: {0}")]
    AlreadyExists(String),
    #[error("Cannot {operation} a payment in status {status}")]
    InvalidState {
        operation: &'static str,
        status: PaymentStatus,
    },
    #[error("Payment already captured under transaction {0}")]
    AlreadyCaptured(String),
    #[error("Refund of {requested} exceeds refundable balance of {available}")]
    RefundExceedsBalance { requested: Money, available: Money },
    #[error("Payment provider is not enabled: {0}")]
    ProviderDisabled(PaymentProvider),
    #[error("Payment was opened with {expected} but the event came from {reported}")]
    ProviderMismatch {
        expected: PaymentProvider,
        reported: PaymentProvider,
    },
    #[error("Payment is for {expected} but the provider reported {reported}")]
    AmountMismatch { expected: Money, reported: Money },
    #[error("Payments are taken in {expected} but the provider reported {reported}")]
    CurrencyMismatch { expected: String, reported: String },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

crate::impl_from_framework_error!(PaymentError);

impl HttpStatus for PaymentError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_)
            | Self::InvalidState { .. }
            | Self::AlreadyCaptured(_)
            | Self::RefundExceedsBalance { .. }
            | Self::ProviderMismatch { .. }
            | Self::AmountMismatch { .. }
            | Self::CurrencyMismatch { .. } => StatusCode::CONFLICT,
            Self::ProviderDisabled(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ActorCommunicationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
