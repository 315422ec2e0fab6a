use chrono::{DateTime, Utc};

use super::actions::{PaymentAction, PaymentActionResult};
use super::PaymentError;
use crate::actor_framework::Entity;
use crate::domain::{Money, Payment, PaymentCreate, PaymentStatus, Refund};
use crate::validation::ValidationErrors;

impl Entity for Payment {
    type Id = String;
    type CreateParams = PaymentCreate;
    type Patch = ();
    type Action = PaymentAction;
    type ActionResult = PaymentActionResult;
    type Error = PaymentError;

    const KIND: &'static str = "payment";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: PaymentCreate) -> Result<Self, PaymentError> {
        Ok(Self {
            id,
            order_id: params.order_id,
            provider: params.provider,
            amount: params.amount,
            status: PaymentStatus::Pending,
            transaction_id: None,
            failure_reason: None,
            refunds: Vec::new(),
            created_at: Utc::now(),
            captured_at: None,
        })
    }

    /// One payment per order.
    fn unique_key(&self) -> Option<String> {
        Some(self.order_id.clone())
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), PaymentError> {
        Ok(())
    }

    fn handle_action(&mut self, action: PaymentAction) -> Result<PaymentActionResult, PaymentError> {
        match action {
            PaymentAction::Capture { transaction_id, at } => self.capture(transaction_id, at),
            PaymentAction::Fail { reason } => self.fail(reason),
            PaymentAction::Refund { amount, reason, at } => self.refund(amount, reason, at),
        }
    }
}

impl Payment {
    fn capture(
        &mut self,
        transaction_id: String,
        at: DateTime<Utc>,
    ) -> Result<PaymentActionResult, PaymentError> {
        match self.status {
            PaymentStatus::Pending | PaymentStatus::Failed => {
                self.status = PaymentStatus::Completed;
                self.transaction_id = Some(transaction_id);
                self.failure_reason = None;
                self.captured_at = Some(at);
                Ok(PaymentActionResult::Captured { changed: true })
            }
            PaymentStatus::Completed if self.transaction_id.as_deref() == Some(transaction_id.as_str()) => {
                Ok(PaymentActionResult::Captured { changed: false })
            }
            PaymentStatus::Completed => Err(PaymentError::AlreadyCaptured(
                self.transaction_id.clone().unwrap_or_default(),
            )),
            status => Err(PaymentError::InvalidState {
                operation: "capture",
                status,
            }),
        }
    }

    fn fail(&mut self, reason: String) -> Result<PaymentActionResult, PaymentError> {
        match self.status {
            PaymentStatus::Pending | PaymentStatus::Failed => {
                self.status = PaymentStatus::Failed;
                self.failure_reason = Some(reason);
                Ok(PaymentActionResult::Failed)
            }
            status => Err(PaymentError::InvalidState {
                operation: "fail",
                status,
            }),
        }
    }

    fn refund(
        &mut self,
        amount: Money,
        reason: String,
        at: DateTime<Utc>,
    ) -> Result<PaymentActionResult, PaymentError> {
        if !self.status.is_captured() {
            return Err(PaymentError::InvalidState {
                operation: "refund",
                status: self.status,
            });
        }
        if amount.is_zero() {
            return Err(ValidationErrors::single("amount", "must be greater than zero").into());
        }
        let available = self.refundable_balance();
        if amount > available {
            return Err(PaymentError::RefundExceedsBalance {
                requested: amount,
                available,
            });
        }

        let refund = Refund {
            id: format!("{}-r{}", self.id, self.refunds.len() + 1),
            amount,
            reason,
            created_at: at,
        };
        self.refunds.push(refund.clone());
        let remaining = self.amount.saturating_sub(self.refunded_total());
        self.status = if remaining.is_zero() {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        Ok(PaymentActionResult::Refunded {
            refund,
            status: self.status,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentProvider;

    fn pending(cents: u64) -> Payment {
        Payment::from_create_params(
            "payment_1".into(),
            PaymentCreate {
                order_id: "order_1".into(),
                provider: PaymentProvider::Stripe,
                amount: Money::from_cents(cents),
            },
        )
        .unwrap()
    }

    fn capture(tx: &str) -> PaymentAction {
        PaymentAction::Capture {
            transaction_id: tx.into(),
            at: Utc::now(),
        }
    }

    fn refund(cents: u64) -> PaymentAction {
        PaymentAction::Refund {
            amount: Money::from_cents(cents),
            reason: "damaged".into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_capture_is_idempotent_per_transaction() {
        let mut payment = pending(1_000);
        assert_eq!(
            payment.handle_action(capture("pi_1")),
            Ok(PaymentActionResult::Captured { changed: true })
        );
        let captured_at = payment.captured_at;
        assert_eq!(
            payment.handle_action(capture("pi_1")),
            Ok(PaymentActionResult::Captured { changed: false })
        );
        assert_eq!(payment.captured_at, captured_at);
        assert_eq!(
            payment.handle_action(capture("pi_2")),
            Err(PaymentError::AlreadyCaptured("pi_1".into()))
        );
    }

    #[test]
    fn test_capture_after_failure() {
        let mut payment = pending(1_000);
        payment
            .handle_action(PaymentAction::Fail {
                reason: "card declined".into(),
            })
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        payment.handle_action(capture("pi_2")).unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.failure_reason, None);
    }

    #[test]
    fn test_refunds_drain_balance() {
        let mut payment = pending(1_000);
        payment.handle_action(capture("pi_1")).unwrap();

        let PaymentActionResult::Refunded {
            refund: recorded,
            status,
            remaining,
        } = payment.handle_action(refund(400)).unwrap()
        else {
            panic!("expected a refund");
        };
        assert_eq!(recorded.id, "payment_1-r1");
        assert_eq!(status, PaymentStatus::PartiallyRefunded);
        assert_eq!(remaining, Money::from_cents(600));

        assert_eq!(
            payment.handle_action(refund(601)),
            Err(PaymentError::RefundExceedsBalance {
                requested: Money::from_cents(601),
                available: Money::from_cents(600),
            })
        );

        payment.handle_action(refund(600)).unwrap();
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refunded_total(), Money::from_cents(1_000));
        assert!(matches!(
            payment.handle_action(refund(1)),
            Err(PaymentError::InvalidState { operation: "refund", .. })
        ));
    }

    #[test]
    fn test_refund_requires_capture() {
        let mut payment = pending(1_000);
        assert_eq!(
            payment.handle_action(refund(100)),
            Err(PaymentError::InvalidState {
                operation: "refund",
                status: PaymentStatus::Pending,
            })
        );
        payment.handle_action(capture("pi_1")).unwrap();
        assert!(matches!(payment.handle_action(refund(0)), Err(PaymentError::Validation(_))));
    }
}
