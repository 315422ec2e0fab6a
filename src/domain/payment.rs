use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    PayPal,
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stripe => f.write_str("stripe"),
            Self::PayPal => f.write_str("paypal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    PartiallyRefunded,
    Refunded,
}

impl PaymentStatus {
    /// Whether captured funds are (at least partly) still held.
    pub fn is_captured(self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyRefunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: Money,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A payment taken for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub provider: PaymentProvider,
    pub amount: Money,
    pub status: PaymentStatus,
    /// Provider-side reference, known once the provider confirms the charge.
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub refunds: Vec<Refund>,
    pub created_at: DateTime<Utc>,
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PaymentCreate {
    pub order_id: String,
    pub provider: PaymentProvider,
    pub amount: Money,
}

impl Payment {
    pub fn refunded_total(&self) -> Money {
        // Refunds are bounded by `amount`, so the sum cannot overflow.
        Money::sum(self.refunds.iter().map(|refund| refund.amount)).unwrap_or(self.amount)
    }

    /// What can still be refunded. Zero unless funds were captured.
    pub fn refundable_balance(&self) -> Money {
        if self.status.is_captured() {
            self.amount.saturating_sub(self.refunded_total())
        } else {
            Money::ZERO
        }
    }
}
