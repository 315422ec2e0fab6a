use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{CartClient, PaymentClient, ProductClient, UserClient};
use crate::domain::{
    Address, CartItem, CheckoutReceipt, CheckoutRequest, Money, Order, OrderCreate, OrderItem, OrderStatus,
    OrderStatusHistory, Payment, PaymentProvider, PricingPolicy, Refund, Requester,
};
use crate::order_actor::{ensure_transition, OrderAction, OrderError};
use crate::payment_actor::PaymentError;
use crate::product_actor::ProductError;
use crate::validation::{Validate, ValidationErrors};
use crate::webhooks::{PaymentEvent, PaymentEventKind};

const CANCEL_REFUND_REASON: &str = "order cancelled";

/// Client for interacting with the Order actor.
///
/// This client handles the orchestration around orders: checkout reserves
/// stock and opens a payment, and status transitions carry out their side
/// effects on products and payments.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    user_client: UserClient,
    product_client: ProductClient,
    cart_client: CartClient,
    payment_client: PaymentClient,
    pricing: PricingPolicy,
}

impl_client_methods!(OrderClient, Order, OrderError, order, orders);

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        user_client: UserClient,
        product_client: ProductClient,
        cart_client: CartClient,
        payment_client: PaymentClient,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            inner,
            user_client,
            product_client,
            cart_client,
            payment_client,
            pricing,
        }
    }

    /// Turns the user's cart into a pending order with a pending payment.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, provider = %request.provider))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, OrderError> {
        info!("Processing checkout");
        request.validate()?;

        let user = self
            .user_client
            .get_user(request.user_id.clone())
            .await
            .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?;
        if user.is_none() {
            warn!("Checkout for unknown user");
            return Err(OrderError::InvalidUser(request.user_id));
        }

        let cart = self
            .cart_client
            .get_cart(request.user_id.clone())
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(OrderError::EmptyCart)?;

        let billing = request
            .billing_address
            .unwrap_or_else(|| request.shipping_address.clone());
        let receipt = self
            .place_order(
                request.user_id.clone(),
                cart.items,
                request.shipping_address,
                billing,
                request.provider,
            )
            .await?;

        if let Err(e) = self.cart_client.clear(request.user_id).await {
            warn!(error = %e, "Order placed but cart could not be cleared");
        }
        Ok(receipt)
    }

    /// Places an order for explicit items.
    ///
    /// Stock is reserved line by line. If any step fails, every reservation
    /// made so far is released before the error is returned.
    #[instrument(skip(self, items, shipping_address, billing_address))]
    pub async fn place_order(
        &self,
        user_id: String,
        items: Vec<CartItem>,
        shipping_address: Address,
        billing_address: Address,
        provider: PaymentProvider,
    ) -> Result<CheckoutReceipt, OrderError> {
        if !self.payment_client.is_enabled(provider) {
            return Err(ValidationErrors::single("provider", format!("{provider} is not enabled")).into());
        }
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        // Step 1: Validate user
        match self.user_client.get_user(user_id.clone()).await {
            Ok(Some(user)) => debug!(user_name = %user.name, "User validation successful"),
            Ok(None) => {
                error!("User not found");
                return Err(OrderError::InvalidUser(user_id));
            }
            Err(e) => {
                error!(error = %e, "User validation failed");
                return Err(OrderError::ActorCommunicationError(e.to_string()));
            }
        }

        // Step 2: Snapshot products
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            match self.product_client.get_product(item.product_id.clone()).await? {
                Some(product) if product.active => lines.push(OrderItem {
                    product_id: product.id,
                    product_name: product.name,
                    unit_price: product.price,
                    quantity: item.quantity,
                }),
                Some(_) | None => {
                    error!(product_id = %item.product_id, "Product not available");
                    return Err(OrderError::InvalidProduct(item.product_id.clone()));
                }
            }
        }

        let totals = self
            .pricing
            .quote(&lines)
            .ok_or_else(|| ValidationErrors::single("items", "order total is too large"))?;

        // Step 3: Reserve stock
        let mut reserved: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Err(e) = self
                .product_client
                .reserve_stock(line.product_id.clone(), line.quantity)
                .await
            {
                error!(error = %e, product_id = %line.product_id, "Stock reservation failed");
                self.release_items(&reserved).await;
                return Err(match e {
                    ProductError::InsufficientStock {
                        product_id,
                        requested,
                        available,
                    } => OrderError::InsufficientStock {
                        product_id,
                        requested,
                        available,
                    },
                    other => other.into(),
                });
            }
            reserved.push(line.clone());
        }
        debug!("Stock reserved successfully");

        // Step 4: Create order
        let params = OrderCreate {
            user_id: user_id.clone(),
            items: lines,
            shipping_address,
            billing_address,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            tax: totals.tax,
            total: totals.total,
            placed_at: Utc::now(),
        };
        let order_id = match self.inner.create(params).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Order creation failed");
                self.release_items(&reserved).await;
                return Err(e);
            }
        };

        // Step 5: Open the payment
        let payment = match self
            .payment_client
            .create_payment(order_id.clone(), provider, totals.total)
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                error!(error = %e, %order_id, "Payment creation failed");
                let cancel = OrderAction::Transition {
                    to: OrderStatus::Cancelled,
                    note: Some("payment could not be created".to_string()),
                    changed_by: Requester::system().user_id,
                    at: Utc::now(),
                };
                if let Err(cancel_err) = self.inner.perform_action(order_id.clone(), cancel).await {
                    error!(error = %cancel_err, %order_id, "Could not cancel order");
                }
                self.release_items(&reserved).await;
                return Err(e.into());
            }
        };

        info!(%order_id, payment_id = %payment.id, total = %totals.total, "Order placed");
        Ok(CheckoutReceipt {
            order_id,
            payment_id: payment.id,
            total: totals.total,
        })
    }

    /// Moves an order to `to`, applying the side effects of the new status.
    #[instrument(skip(self, note, requester), fields(requester = %requester.user_id))]
    pub async fn transition(
        &self,
        order_id: String,
        to: OrderStatus,
        note: Option<String>,
        requester: &Requester,
    ) -> Result<Order, OrderError> {
        let order = self.inner.fetch(order_id.clone()).await?;
        authorize_transition(&order, to, requester)?;
        ensure_transition(order.status, to)?;

        match to {
            OrderStatus::Confirmed => {
                let payment = self.payment_of(&order_id).await?;
                if !payment.status.is_captured() {
                    let transaction_id = format!("manual-{}", payment.id);
                    self.payment_client.capture(payment.id, transaction_id).await?;
                }
            }
            OrderStatus::Refunded => {
                let payment = self.payment_of(&order_id).await?;
                let balance = payment.refundable_balance();
                if !balance.is_zero() {
                    let reason = note.clone().unwrap_or_else(|| "order refunded".to_string());
                    self.payment_client.refund(payment.id, balance, reason).await?;
                }
            }
            _ => {}
        }

        self.apply(&order_id, to, note, &requester.user_id).await?;

        if to == OrderStatus::Cancelled {
            self.release_items(&order.items).await;
            if let Some(payment) = self.payment_client.payment_for_order(order_id.clone()).await? {
                let balance = payment.refundable_balance();
                if !balance.is_zero() {
                    self.payment_client
                        .refund(payment.id, balance, CANCEL_REFUND_REASON.to_string())
                        .await?;
                }
            }
        }

        self.inner.fetch(order_id).await
    }

    /// Refunds part or all of an order's captured payment. Admins only.
    ///
    /// A delivered order whose balance reaches zero moves to `Refunded`.
    #[instrument(skip(self, requester), fields(requester = %requester.user_id))]
    pub async fn refund_order(
        &self,
        order_id: String,
        amount: Money,
        reason: String,
        requester: &Requester,
    ) -> Result<Refund, OrderError> {
        if !requester.is_admin() {
            return Err(OrderError::Forbidden("only admins can issue refunds".to_string()));
        }
        let order = self.inner.fetch(order_id.clone()).await?;
        let payment = self.payment_of(&order_id).await?;
        let refund = self.payment_client.refund(payment.id.clone(), amount, reason.clone()).await?;
        self.complete_refund_if_drained(&order, &payment.id, reason, &requester.user_id)
            .await?;
        Ok(refund)
    }

    /// Applies a provider notification to the order's payment and status.
    ///
    /// Events from another provider than the payment's, or in another
    /// currency than the store's, are rejected before anything changes. A
    /// success only captures when it reports the full payment amount.
    #[instrument(skip(self, event), fields(order_id = %event.order_id, provider = %event.provider))]
    pub async fn handle_payment_event(&self, event: PaymentEvent) -> Result<Order, OrderError> {
        let order = self.inner.fetch(event.order_id.clone()).await?;
        let payment = self.payment_of(&order.id).await?;
        let system = Requester::system();

        if event.provider != payment.provider {
            warn!(expected = %payment.provider, "Event from another provider");
            return Err(PaymentError::ProviderMismatch {
                expected: payment.provider,
                reported: event.provider,
            }
            .into());
        }
        self.payment_client.ensure_currency(event.currency.as_deref())?;

        match event.kind {
            PaymentEventKind::Succeeded => {
                if event.amount != payment.amount {
                    warn!(expected = %payment.amount, reported = %event.amount, "Captured amount differs");
                    return Err(PaymentError::AmountMismatch {
                        expected: payment.amount,
                        reported: event.amount,
                    }
                    .into());
                }
                let payment = self
                    .payment_client
                    .capture(payment.id, event.transaction_id)
                    .await?;
                self.settle_capture(&order.id, &payment.id, &system).await?;
            }
            PaymentEventKind::Failed { reason } => {
                self.payment_client.fail(payment.id, reason).await?;
            }
            PaymentEventKind::Refunded => {
                let reason = format!("refunded via {}", event.provider);
                self.payment_client
                    .refund(payment.id.clone(), event.amount, reason.clone())
                    .await?;
                self.complete_refund_if_drained(&order, &payment.id, reason, &system.user_id)
                    .await?;
            }
            PaymentEventKind::RefundedTotal => {
                let recorded = payment.refunded_total();
                match event.amount.checked_sub(recorded).filter(|delta| !delta.is_zero()) {
                    Some(delta) => {
                        let reason = format!("refunded via {}", event.provider);
                        self.payment_client
                            .refund(payment.id.clone(), delta, reason.clone())
                            .await?;
                        self.complete_refund_if_drained(&order, &payment.id, reason, &system.user_id)
                            .await?;
                    }
                    None => debug!(%recorded, "Refund total already recorded"),
                }
            }
        }

        self.inner.fetch(order.id).await
    }

    /// Confirms a pending order once its payment is captured, or hands the
    /// money back if the order was cancelled meanwhile. The order is read
    /// again after the capture since a cancellation may have landed while
    /// the provider event was in flight.
    async fn settle_capture(&self, order_id: &str, payment_id: &str, system: &Requester) -> Result<(), OrderError> {
        let current = self.inner.fetch(order_id.to_string()).await?;
        let status = if current.status == OrderStatus::Pending {
            match self
                .transition(
                    order_id.to_string(),
                    OrderStatus::Confirmed,
                    Some("payment received".into()),
                    system,
                )
                .await
            {
                Ok(order) => order.status,
                Err(OrderError::InvalidTransition { from, .. }) => from,
                Err(e) => return Err(e),
            }
        } else {
            current.status
        };

        if status == OrderStatus::Cancelled {
            self.refund_late_capture(payment_id).await?;
        }
        Ok(())
    }

    /// Refunds funds captured after the order was cancelled. A concurrent
    /// cancellation may already have refunded them.
    async fn refund_late_capture(&self, payment_id: &str) -> Result<(), OrderError> {
        let balance = self.payment_client.refundable_balance(payment_id.to_string()).await?;
        if balance.is_zero() {
            return Ok(());
        }
        match self
            .payment_client
            .refund(payment_id.to_string(), balance, CANCEL_REFUND_REASON.to_string())
            .await
        {
            Ok(refund) => {
                info!(refund_id = %refund.id, "Refunded payment captured after cancellation");
                Ok(())
            }
            Err(PaymentError::RefundExceedsBalance { .. } | PaymentError::InvalidState { .. }) => {
                debug!("Cancellation already refunded the capture");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns an order the requester may see: their own, or any for admins.
    #[instrument(skip(self, requester), fields(requester = %requester.user_id))]
    pub async fn get_order_for(&self, order_id: String, requester: &Requester) -> Result<Order, OrderError> {
        let order = self.inner.fetch(order_id).await?;
        if !requester.is_admin() && order.user_id != requester.user_id {
            return Err(OrderError::Forbidden("order belongs to another user".to_string()));
        }
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn history(&self, order_id: String) -> Result<Vec<OrderStatusHistory>, OrderError> {
        Ok(self.inner.fetch(order_id).await?.history)
    }

    #[instrument(skip(self))]
    pub async fn list_orders_for_user(&self, user_id: String) -> Result<Vec<Order>, OrderError> {
        self.inner.list(move |order| order.user_id == user_id).await
    }

    /// Orders in `status`, or every order when `status` is `None`.
    #[instrument(skip(self))]
    pub async fn list_orders_by_status(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, OrderError> {
        self.inner
            .list(move |order| status.map_or(true, |s| order.status == s))
            .await
    }

    async fn apply(
        &self,
        order_id: &str,
        to: OrderStatus,
        note: Option<String>,
        changed_by: &str,
    ) -> Result<(), OrderError> {
        let action = OrderAction::Transition {
            to,
            note,
            changed_by: changed_by.to_string(),
            at: Utc::now(),
        };
        match self.inner.perform_action(order_id.to_string(), action).await {
            Ok(result) => {
                info!(?result, "Order status changed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Transition rejected");
                Err(e)
            }
        }
    }

    async fn payment_of(&self, order_id: &str) -> Result<Payment, OrderError> {
        self.payment_client
            .payment_for_order(order_id.to_string())
            .await?
            .ok_or_else(|| OrderError::PaymentMissing(order_id.to_string()))
    }

    async fn complete_refund_if_drained(
        &self,
        order: &Order,
        payment_id: &str,
        reason: String,
        changed_by: &str,
    ) -> Result<(), OrderError> {
        let remaining = self.payment_client.refundable_balance(payment_id.to_string()).await?;
        if remaining.is_zero() && order.status == OrderStatus::Delivered {
            self.apply(&order.id, OrderStatus::Refunded, Some(reason), changed_by)
                .await?;
        }
        Ok(())
    }

    /// Puts reserved units back. Failures are logged so the remaining lines
    /// are still released.
    async fn release_items(&self, items: &[OrderItem]) {
        for item in items {
            if let Err(e) = self
                .product_client
                .release_stock(item.product_id.clone(), item.quantity)
                .await
            {
                error!(error = %e, product_id = %item.product_id, "Failed to release stock");
            }
        }
    }
}

/// Admins may request any transition. Customers may only cancel their own
/// order before it is being processed.
fn authorize_transition(order: &Order, to: OrderStatus, requester: &Requester) -> Result<(), OrderError> {
    if requester.is_admin() {
        return Ok(());
    }
    if order.user_id != requester.user_id {
        return Err(OrderError::Forbidden("order belongs to another user".to_string()));
    }
    let cancellable = matches!(order.status, OrderStatus::Pending | OrderStatus::Confirmed);
    if to == OrderStatus::Cancelled && cancellable {
        Ok(())
    } else {
        Err(OrderError::Forbidden(format!(
            "customers cannot move an order from {} to {to}",
            order.status
        )))
    }
}
