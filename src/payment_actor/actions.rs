use chrono::{DateTime, Utc};

use crate::domain::{Money, PaymentStatus, Refund};

#[derive(Debug, Clone)]
pub enum PaymentAction {
    /// Marks funds as taken by the provider under `transaction_id`.
    Capture {
        transaction_id: String,
        at: DateTime<Utc>,
    },
    Fail { reason: String },
    /// Records a refund. Checked against the refundable balance in the same
    /// message that records it.
    Refund {
        amount: Money,
        reason: String,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentActionResult {
    /// `changed` is false when the same capture was already recorded.
    Captured { changed: bool },
    Failed,
    Refunded { refund: Refund, status: PaymentStatus, remaining: Money },
}
