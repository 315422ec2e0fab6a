//! Normalizes Stripe and PayPal webhook payloads into [`PaymentEvent`]s.
//!
//! Signatures are checked upstream; this module only reads the JSON body.

use std::collections::HashMap;

use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Money, PaymentProvider};
use crate::error::HttpStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed { reason: String },
    /// A single refund of the event amount.
    Refunded,
    /// The provider's running total of everything refunded so far.
    RefundedTotal,
}

/// A provider notification about the payment for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub provider: PaymentProvider,
    pub kind: PaymentEventKind,
    pub order_id: String,
    pub transaction_id: String,
    pub amount: Money,
    /// ISO 4217 code, upper-cased, when the provider reports one.
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("Malformed {provider} webhook: {message}")]
    Malformed {
        provider: PaymentProvider,
        message: String,
    },
    #[error("{provider} webhook is missing {field}")]
    MissingField {
        provider: PaymentProvider,
        field: &'static str,
    },
}

impl HttpStatus for WebhookError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Parses a webhook body. Event types that carry no payment change yield
/// `Ok(None)`.
pub fn parse_webhook(provider: PaymentProvider, body: &str) -> Result<Option<PaymentEvent>, WebhookError> {
    let event = match provider {
        PaymentProvider::Stripe => parse_stripe(body)?,
        PaymentProvider::PayPal => parse_paypal(body)?,
    };
    if event.is_none() {
        debug!(%provider, "Ignoring webhook event type");
    }
    Ok(event)
}

fn malformed(provider: PaymentProvider) -> impl FnOnce(serde_json::Error) -> WebhookError {
    move |err| WebhookError::Malformed {
        provider,
        message: err.to_string(),
    }
}

// --- Stripe ---

#[derive(Deserialize)]
struct StripeEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeData,
}

#[derive(Deserialize)]
struct StripeData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct StripeObject {
    id: String,
    amount: u64,
    #[serde(default)]
    amount_refunded: u64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    last_payment_error: Option<StripePaymentError>,
}

#[derive(Deserialize)]
struct StripePaymentError {
    message: Option<String>,
}

fn parse_stripe(body: &str) -> Result<Option<PaymentEvent>, WebhookError> {
    const PROVIDER: PaymentProvider = PaymentProvider::Stripe;

    let envelope: StripeEnvelope = serde_json::from_str(body).map_err(malformed(PROVIDER))?;
    if !matches!(
        envelope.event_type.as_str(),
        "payment_intent.succeeded" | "payment_intent.payment_failed" | "charge.refunded"
    ) {
        return Ok(None);
    }

    let object: StripeObject = serde_json::from_value(envelope.data.object).map_err(malformed(PROVIDER))?;
    let order_id = object
        .metadata
        .get("order_id")
        .cloned()
        .ok_or(WebhookError::MissingField {
            provider: PROVIDER,
            field: "data.object.metadata.order_id",
        })?;

    let (kind, transaction_id, amount) = match envelope.event_type.as_str() {
        "payment_intent.payment_failed" => {
            let reason = object
                .last_payment_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "payment failed".to_string());
            (PaymentEventKind::Failed { reason }, object.id, object.amount)
        }
        // Refunds are reported on the charge; the intent id ties them back
        // to the captured payment.
        "charge.refunded" => (
            PaymentEventKind::RefundedTotal,
            object.payment_intent.unwrap_or(object.id),
            object.amount_refunded,
        ),
        _ => (PaymentEventKind::Succeeded, object.id, object.amount),
    };

    Ok(Some(PaymentEvent {
        provider: PROVIDER,
        kind,
        order_id,
        transaction_id,
        amount: Money::from_cents(amount),
        currency: object.currency.map(|c| c.to_ascii_uppercase()),
    }))
}

// --- PayPal ---

#[derive(Deserialize)]
struct PayPalEnvelope {
    event_type: String,
    resource: serde_json::Value,
}

#[derive(Deserialize)]
struct PayPalResource {
    id: String,
    custom_id: Option<String>,
    amount: PayPalAmount,
    #[serde(default)]
    status_details: Option<PayPalStatusDetails>,
}

#[derive(Deserialize)]
struct PayPalAmount {
    #[serde(default)]
    currency_code: Option<String>,
    value: String,
}

#[derive(Deserialize)]
struct PayPalStatusDetails {
    reason: Option<String>,
}

fn parse_paypal(body: &str) -> Result<Option<PaymentEvent>, WebhookError> {
    const PROVIDER: PaymentProvider = PaymentProvider::PayPal;

    let envelope: PayPalEnvelope = serde_json::from_str(body).map_err(malformed(PROVIDER))?;
    if !matches!(
        envelope.event_type.as_str(),
        "PAYMENT.CAPTURE.COMPLETED" | "PAYMENT.CAPTURE.DENIED" | "PAYMENT.CAPTURE.REFUNDED"
    ) {
        return Ok(None);
    }

    let resource: PayPalResource = serde_json::from_value(envelope.resource).map_err(malformed(PROVIDER))?;
    let order_id = resource.custom_id.ok_or(WebhookError::MissingField {
        provider: PROVIDER,
        field: "resource.custom_id",
    })?;
    let amount: Money = resource.amount.value.parse().map_err(|e| WebhookError::Malformed {
        provider: PROVIDER,
        message: format!("resource.amount.value: {e}"),
    })?;

    let currency = resource.amount.currency_code.map(|c| c.to_ascii_uppercase());

    let kind = match envelope.event_type.as_str() {
        "PAYMENT.CAPTURE.COMPLETED" => PaymentEventKind::Succeeded,
        "PAYMENT.CAPTURE.DENIED" => PaymentEventKind::Failed {
            reason: resource
                .status_details
                .and_then(|d| d.reason)
                .unwrap_or_else(|| "capture denied".to_string()),
        },
        _ => PaymentEventKind::Refunded,
    };

    Ok(Some(PaymentEvent {
        provider: PROVIDER,
        kind,
        order_id,
        transaction_id: resource.id,
        amount,
        currency,
    }))
}
