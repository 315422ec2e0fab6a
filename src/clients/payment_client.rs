use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{Money, Payment, PaymentCreate, PaymentProvider, Refund};
use crate::payment_actor::{PaymentAction, PaymentActionResult, PaymentError};
use crate::validation::Validate;

/// Client for the Payment actor.
#[derive(Clone)]
pub struct PaymentClient {
    inner: ResourceClient<Payment>,
    providers: Arc<[PaymentProvider]>,
    currency: Arc<str>,
}

impl_client_methods!(PaymentClient, Payment, PaymentError, payment, payments);

impl PaymentClient {
    /// `providers` are the providers checkout may use; `currency` is the
    /// ISO code every payment is taken in.
    pub fn new(
        inner: ResourceClient<Payment>,
        providers: impl Into<Arc<[PaymentProvider]>>,
        currency: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            inner,
            providers: providers.into(),
            currency: currency.into(),
        }
    }

    pub fn is_enabled(&self, provider: PaymentProvider) -> bool {
        self.providers.contains(&provider)
    }

    /// Rejects a provider-reported currency other than the store's.
    /// Providers that omit the currency are trusted.
    pub fn ensure_currency(&self, reported: Option<&str>) -> Result<(), PaymentError> {
        match reported {
            Some(code) if !code.eq_ignore_ascii_case(&self.currency) => Err(PaymentError::CurrencyMismatch {
                expected: self.currency.to_string(),
                reported: code.to_string(),
            }),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self))]
    pub async fn create_payment(
        &self,
        order_id: String,
        provider: PaymentProvider,
        amount: Money,
    ) -> Result<Payment, PaymentError> {
        if !self.is_enabled(provider) {
            return Err(PaymentError::ProviderDisabled(provider));
        }
        let params = PaymentCreate {
            order_id,
            provider,
            amount,
        };
        params.validate()?;
        let id = self.inner.create(params).await?;
        info!(payment_id = %id, "Payment created");
        self.inner.fetch(id).await
    }

    /// Captures the payment. Repeating a capture with the same transaction
    /// id succeeds without changing anything.
    #[instrument(skip(self))]
    pub async fn capture(&self, payment_id: String, transaction_id: String) -> Result<Payment, PaymentError> {
        let action = PaymentAction::Capture {
            transaction_id,
            at: Utc::now(),
        };
        match self.inner.perform_action(payment_id.clone(), action).await? {
            PaymentActionResult::Captured { changed: true } => info!("Payment captured"),
            PaymentActionResult::Captured { changed: false } => debug!("Capture already recorded"),
            _ => return Err(PaymentError::ActorCommunicationError("Unexpected result".to_string())),
        }
        self.inner.fetch(payment_id).await
    }

    #[instrument(skip(self))]
    pub async fn fail(&self, payment_id: String, reason: String) -> Result<Payment, PaymentError> {
        match self
            .inner
            .perform_action(payment_id.clone(), PaymentAction::Fail { reason })
            .await?
        {
            PaymentActionResult::Failed => warn!("Payment failed"),
            _ => return Err(PaymentError::ActorCommunicationError("Unexpected result".to_string())),
        }
        self.inner.fetch(payment_id).await
    }

    /// Records a refund against the captured balance.
    #[instrument(skip(self))]
    pub async fn refund(&self, payment_id: String, amount: Money, reason: String) -> Result<Refund, PaymentError> {
        let action = PaymentAction::Refund {
            amount,
            reason,
            at: Utc::now(),
        };
        match self.inner.perform_action(payment_id, action).await {
            Ok(PaymentActionResult::Refunded {
                refund,
                status,
                remaining,
            }) => {
                info!(refund_id = %refund.id, %status, %remaining, "Refund recorded");
                Ok(refund)
            }
            Ok(_) => Err(PaymentError::ActorCommunicationError("Unexpected result".to_string())),
            Err(e) => {
                warn!(error = %e, "Refund rejected");
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn refundable_balance(&self, payment_id: String) -> Result<Money, PaymentError> {
        Ok(self.inner.fetch(payment_id).await?.refundable_balance())
    }

    #[instrument(skip(self))]
    pub async fn payment_for_order(&self, order_id: String) -> Result<Option<Payment>, PaymentError> {
        let mut found = self.inner.list(move |payment| payment.order_id == order_id).await?;
        Ok(found.pop())
    }
}
