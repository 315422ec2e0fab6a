#[cfg(test)]
mod tests {
    use http::StatusCode;
    use tokio::task::JoinSet;

    use crate::app_system::StoreSystem;
    use crate::cart_actor::CartError;
    use crate::category_actor::CategoryError;
    use crate::clients::{CartClient, OrderClient, PaymentClient, ProductClient, UserClient};
    use crate::config::Config;
    use crate::domain::{
        Address, CartItem, Category, CategoryCreate, CheckoutReceipt, CheckoutRequest, Money, Order, OrderStatus,
        Payment, PaymentProvider, PaymentStatus, PricingPolicy, Product, ProductCreate, ProductPatch, Requester,
        Role, User, UserCreate,
    };
    use crate::error::{HttpStatus, StoreError};
    use crate::mock_framework::{create_mock_client, expect_action, expect_get};
    use crate::order_actor::OrderError;
    use crate::payment_actor::PaymentError;
    use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
    use crate::user_actor::UserError;
    use crate::webhooks::parse_webhook;

    struct Store {
        system: StoreSystem,
        admin: Requester,
        customer: User,
        category: Category,
        lamp: Product,
        bulb: Product,
    }

    /// Lamp: 20.00, 5 in stock. Bulb: 5.00, 20 in stock. Tax 10%, shipping
    /// 5.00 below 50.00.
    async fn store() -> Store {
        let mut config = Config::default();
        config.checkout.tax_rate_bps = 1_000;
        let system = StoreSystem::new(&config);

        let admin = system
            .user_client
            .register(UserCreate::admin("Grace", "grace@example.com"))
            .await
            .unwrap();
        let customer = system
            .user_client
            .register(UserCreate::customer("Ada", "ada@example.com"))
            .await
            .unwrap();
        let category = system
            .category_client
            .create_category(CategoryCreate::new("Lighting", "lighting"))
            .await
            .unwrap();
        let lamp = system
            .product_client
            .create_product(ProductCreate::new("LAMP-1", "Desk Lamp", Money::from_cents(2_000), 5, &category.id))
            .await
            .unwrap();
        let bulb = system
            .product_client
            .create_product(ProductCreate::new("BULB-1", "LED Bulb", Money::from_cents(500), 20, &category.id))
            .await
            .unwrap();

        Store {
            system,
            admin: Requester::from(&admin),
            customer,
            category,
            lamp,
            bulb,
        }
    }

    fn address() -> Address {
        Address::new("Ada", "1 Loop Rd", "Springfield", "12345", "US")
    }

    fn checkout_request(user_id: &str) -> CheckoutRequest {
        CheckoutRequest {
            user_id: user_id.to_string(),
            shipping_address: address(),
            billing_address: None,
            provider: PaymentProvider::Stripe,
        }
    }

    async fn checkout(store: &Store, items: &[(&Product, u32)]) -> Result<CheckoutReceipt, OrderError> {
        for (product, quantity) in items {
            store
                .system
                .cart_client
                .add_item(store.customer.id.clone(), product.id.clone(), *quantity)
                .await
                .unwrap();
        }
        store.system.order_client.checkout(checkout_request(&store.customer.id)).await
    }

    fn stripe(event_type: &str, order_id: &str, object: serde_json::Value) -> String {
        let mut object = object;
        object["metadata"] = serde_json::json!({ "order_id": order_id });
        serde_json::json!({ "type": event_type, "data": { "object": object } }).to_string()
    }

    async fn deliver(store: &Store, body: &str) -> Result<Order, OrderError> {
        let event = parse_webhook(PaymentProvider::Stripe, body).unwrap().unwrap();
        store.system.order_client.handle_payment_event(event).await
    }

    async fn pay(store: &Store, receipt: &CheckoutReceipt) -> Order {
        let body = stripe(
            "payment_intent.succeeded",
            &receipt.order_id,
            serde_json::json!({ "id": "pi_1", "amount": receipt.total.cents() }),
        );
        deliver(store, &body).await.unwrap()
    }

    async fn payment(store: &Store, order_id: &str) -> Payment {
        store
            .system
            .payment_client
            .payment_for_order(order_id.to_string())
            .await
            .unwrap()
            .unwrap()
    }

    async fn stock(store: &Store, product: &Product) -> u32 {
        store.system.product_client.check_stock(product.id.clone()).await.unwrap()
    }

    async fn advance(store: &Store, order_id: &str, path: &[OrderStatus]) {
        for status in path {
            store
                .system
                .order_client
                .transition(order_id.to_string(), *status, None, &store.admin)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_order_placement_releases_reservations_on_failure() {
        let (users, mut user_rx) = create_mock_client::<User>(10);
        let (products, mut product_rx) = create_mock_client::<Product>(10);
        let (categories, _category_rx) = create_mock_client::<Category>(10);
        let (carts, _cart_rx) = create_mock_client(10);
        let (payments, _payment_rx) = create_mock_client(10);
        let (orders, mut order_rx) = create_mock_client::<Order>(10);

        let user_client = UserClient::new(users);
        let product_client = ProductClient::new(products, categories);
        let cart_client = CartClient::new(carts, user_client.clone(), product_client.clone());
        let payment_client = PaymentClient::new(payments, vec![PaymentProvider::Stripe], "USD");
        let order_client = OrderClient::new(
            orders,
            user_client,
            product_client,
            cart_client,
            payment_client,
            PricingPolicy {
                tax_rate_bps: 0,
                flat_shipping: Money::ZERO,
                free_shipping_threshold: None,
            },
        );

        let order_task = tokio::spawn(async move {
            order_client
                .place_order(
                    "user_1".into(),
                    vec![CartItem::new("product_1", 2), CartItem::new("product_2", 5)],
                    address(),
                    address(),
                    PaymentProvider::Stripe,
                )
                .await
        });

        let (user_id, responder) = expect_get(&mut user_rx).await.expect("Expected User Get");
        assert_eq!(user_id, "user_1");
        responder
            .send(Ok(Some(User {
                id: "user_1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role: Role::Customer,
                created_at: chrono::Utc::now(),
            })))
            .unwrap();

        for (id, stock) in [("product_1", 10), ("product_2", 1)] {
            let (product_id, responder) = expect_get(&mut product_rx).await.expect("Expected Product Get");
            assert_eq!(product_id, id);
            responder
                .send(Ok(Some(Product {
                    id: id.into(),
                    sku: id.to_uppercase(),
                    name: "Widget".into(),
                    description: None,
                    price: Money::from_cents(1_000),
                    stock,
                    category_id: "category_1".into(),
                    active: true,
                })))
                .unwrap();
        }

        let (product_id, action, responder) = expect_action(&mut product_rx).await.expect("Expected reservation");
        assert_eq!(product_id, "product_1");
        assert!(matches!(action, ProductAction::ReserveStock(2)));
        responder.send(Ok(ProductActionResult::Reserved { remaining: 8 })).unwrap();

        let (product_id, action, responder) = expect_action(&mut product_rx).await.expect("Expected reservation");
        assert_eq!(product_id, "product_2");
        assert!(matches!(action, ProductAction::ReserveStock(5)));
        responder
            .send(Err(ProductError::InsufficientStock {
                product_id: "product_2".into(),
                requested: 5,
                available: 1,
            }))
            .unwrap();

        // The first reservation is handed back.
        let (product_id, action, responder) = expect_action(&mut product_rx).await.expect("Expected release");
        assert_eq!(product_id, "product_1");
        assert!(matches!(action, ProductAction::ReleaseStock(2)));
        responder.send(Ok(ProductActionResult::Released { stock: 10 })).unwrap();

        let result = order_task.await.unwrap();
        assert_eq!(
            result,
            Err(OrderError::InsufficientStock {
                product_id: "product_2".into(),
                requested: 5,
                available: 1,
            })
        );
        assert!(order_rx.try_recv().is_err(), "no order may be created");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let store = store().await;
        let err = store
            .system
            .user_client
            .register(UserCreate::customer("Imposter", "ADA@Example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, UserError::AlreadyExists("ada@example.com".into()));
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);

        let err = store
            .system
            .user_client
            .register(UserCreate::customer("", "nope"))
            .await
            .unwrap_err();
        let err = StoreError::from(err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.validation_errors().unwrap().for_field("email").is_some());
    }

    #[tokio::test]
    async fn test_checkout_prices_reserves_and_clears_cart() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 2), (&store.bulb, 1)]).await.unwrap();

        // 45.00 subtotal, 5.00 shipping, 4.50 tax.
        assert_eq!(receipt.total, Money::from_cents(5_450));

        let order = store
            .system
            .order_client
            .get_order(receipt.order_id.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal, Money::from_cents(4_500));
        assert_eq!(order.shipping, Money::from_cents(500));
        assert_eq!(order.tax, Money::from_cents(450));
        assert_eq!(order.billing_address, order.shipping_address);
        assert_eq!(order.history.len(), 1);
        assert_eq!(order.items[0].product_name, "Desk Lamp");

        assert_eq!(stock(&store, &store.lamp).await, 3);
        assert_eq!(stock(&store, &store.bulb).await, 19);

        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.id, receipt.payment_id);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, receipt.total);

        let cart = store.system.cart_client.get_cart(store.customer.id.clone()).await.unwrap();
        assert!(cart.unwrap().is_empty());

        let err = store
            .system
            .order_client
            .checkout(checkout_request(&store.customer.id))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::EmptyCart);
    }

    #[tokio::test]
    async fn test_failed_checkout_leaves_stock_unchanged() {
        let store = store().await;
        for (product, quantity) in [(&store.bulb, 3), (&store.lamp, 4)] {
            store
                .system
                .cart_client
                .add_item(store.customer.id.clone(), product.id.clone(), quantity)
                .await
                .unwrap();
        }
        // Stock drops after the lamp went into the cart.
        store
            .system
            .product_client
            .update_product(
                store.lamp.id.clone(),
                ProductPatch {
                    stock: Some(2),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        let err = store
            .system
            .order_client
            .checkout(checkout_request(&store.customer.id))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientStock {
                product_id: store.lamp.id.clone(),
                requested: 4,
                available: 2,
            }
        );
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);

        assert_eq!(stock(&store, &store.bulb).await, 20);
        assert_eq!(stock(&store, &store.lamp).await, 2);
        assert!(store.system.order_client.list_orders().await.unwrap().is_empty());
        let cart = store.system.cart_client.get_cart(store.customer.id.clone()).await.unwrap();
        assert_eq!(cart.unwrap().items.len(), 2, "cart survives a failed checkout");
    }

    #[tokio::test]
    async fn test_disabled_provider_is_a_validation_error() {
        let mut config = Config::default();
        config.payments.providers = vec![PaymentProvider::PayPal];
        let system = StoreSystem::new(&config);
        let user = system
            .user_client
            .register(UserCreate::customer("Ada", "ada@example.com"))
            .await
            .unwrap();

        let err = system
            .order_client
            .place_order(
                user.id,
                vec![CartItem::new("product_1", 1)],
                address(),
                address(),
                PaymentProvider::Stripe,
            )
            .await
            .unwrap_err();
        let err = StoreError::from(err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.validation_errors().unwrap().for_field("provider"),
            Some("stripe is not enabled")
        );
    }

    #[tokio::test]
    async fn test_payment_webhook_confirms_order_once() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 1)]).await.unwrap();

        let order = pay(&store, &receipt).await;
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.history.len(), 2);
        assert_eq!(order.history[1].changed_by, "system");
        let first = payment(&store, &receipt.order_id).await;
        assert_eq!(first.status, PaymentStatus::Completed);
        assert_eq!(first.transaction_id.as_deref(), Some("pi_1"));

        // Redelivery of the same event.
        let order = pay(&store, &receipt).await;
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.history.len(), 2);
        assert_eq!(payment(&store, &receipt.order_id).await, first);
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_order_pending() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.bulb, 2)]).await.unwrap();

        let body = stripe(
            "payment_intent.payment_failed",
            &receipt.order_id,
            serde_json::json!({
                "id": "pi_1",
                "amount": receipt.total.cents(),
                "last_payment_error": { "message": "Your card was declined." }
            }),
        );
        let order = deliver(&store, &body).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        let failed = payment(&store, &receipt.order_id).await;
        assert_eq!(failed.status, PaymentStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("Your card was declined."));

        let order = pay(&store, &receipt).await;
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_customer_cancel_restores_stock_and_refunds() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 2)]).await.unwrap();
        pay(&store, &receipt).await;
        assert_eq!(stock(&store, &store.lamp).await, 3);

        let customer = Requester::from(&store.customer);
        let order = store
            .system
            .order_client
            .transition(
                receipt.order_id.clone(),
                OrderStatus::Cancelled,
                Some("changed my mind".into()),
                &customer,
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        let last = order.history.last().unwrap();
        assert_eq!(last.from, Some(OrderStatus::Confirmed));
        assert_eq!(last.note.as_deref(), Some("changed my mind"));
        assert_eq!(last.changed_by, store.customer.id);

        assert_eq!(stock(&store, &store.lamp).await, 5);
        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refunds.len(), 1);
        assert_eq!(payment.refunds[0].amount, receipt.total);
        assert_eq!(payment.refunds[0].reason, "order cancelled");
    }

    #[tokio::test]
    async fn test_invalid_transitions_leave_history_unchanged() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.bulb, 1)]).await.unwrap();
        let orders = &store.system.order_client;

        let err = orders
            .transition(receipt.order_id.clone(), OrderStatus::Shipped, None, &store.admin)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped,
            }
        );
        assert_eq!(orders.history(receipt.order_id.clone()).await.unwrap().len(), 1);

        // Confirming by hand captures the pending payment.
        advance(&store, &receipt.order_id, &[OrderStatus::Confirmed]).await;
        let captured = payment(&store, &receipt.order_id).await;
        assert_eq!(captured.status, PaymentStatus::Completed);
        assert_eq!(captured.transaction_id, Some(format!("manual-{}", captured.id)));

        advance(&store, &receipt.order_id, &[OrderStatus::Cancelled]).await;
        let err = orders
            .transition(receipt.order_id.clone(), OrderStatus::Processing, None, &store.admin)
            .await
            .unwrap_err();
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);

        let history = orders.history(receipt.order_id.clone()).await.unwrap();
        let trail: Vec<_> = history.iter().map(|row| (row.from, row.to)).collect();
        assert_eq!(
            trail,
            vec![
                (None, OrderStatus::Pending),
                (Some(OrderStatus::Pending), OrderStatus::Confirmed),
                (Some(OrderStatus::Confirmed), OrderStatus::Cancelled),
            ]
        );
    }

    #[tokio::test]
    async fn test_customers_cannot_fulfil_or_touch_other_orders() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.bulb, 1)]).await.unwrap();
        pay(&store, &receipt).await;
        let orders = &store.system.order_client;

        let owner = Requester::from(&store.customer);
        let err = orders
            .transition(receipt.order_id.clone(), OrderStatus::Processing, None, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Forbidden(_)));
        assert_eq!(StoreError::from(err).status_code(), StatusCode::FORBIDDEN);

        let stranger = Requester::customer("user_99");
        assert!(matches!(
            orders.get_order_for(receipt.order_id.clone(), &stranger).await,
            Err(OrderError::Forbidden(_))
        ));
        assert!(orders.get_order_for(receipt.order_id.clone(), &owner).await.is_ok());

        // Once processing, the owner can no longer cancel.
        advance(&store, &receipt.order_id, &[OrderStatus::Processing]).await;
        assert!(matches!(
            orders
                .transition(receipt.order_id.clone(), OrderStatus::Cancelled, None, &owner)
                .await,
            Err(OrderError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_refunds_cannot_exceed_balance() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 2)]).await.unwrap();
        assert_eq!(receipt.total, Money::from_cents(4_900));
        pay(&store, &receipt).await;
        advance(
            &store,
            &receipt.order_id,
            &[OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered],
        )
        .await;
        let orders = &store.system.order_client;

        let customer = Requester::from(&store.customer);
        assert!(matches!(
            orders
                .refund_order(receipt.order_id.clone(), Money::from_cents(100), "please".into(), &customer)
                .await,
            Err(OrderError::Forbidden(_))
        ));

        let err = orders
            .refund_order(receipt.order_id.clone(), Money::from_cents(6_000), "too much".into(), &store.admin)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::Payment(PaymentError::RefundExceedsBalance {
                requested: Money::from_cents(6_000),
                available: Money::from_cents(4_900),
            })
        );
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);

        orders
            .refund_order(receipt.order_id.clone(), Money::from_cents(900), "scratched".into(), &store.admin)
            .await
            .unwrap();
        let order = orders.get_order(receipt.order_id.clone()).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);

        orders
            .refund_order(receipt.order_id.clone(), Money::from_cents(4_000), "returned".into(), &store.admin)
            .await
            .unwrap();
        let order = orders.get_order(receipt.order_id.clone()).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);
        let last = order.history.last().unwrap();
        assert_eq!(last.note.as_deref(), Some("returned"));
        assert_eq!(last.changed_by, store.admin.user_id);

        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refundable_balance(), Money::ZERO);
    }

    #[tokio::test]
    async fn test_stripe_refund_total_is_applied_once() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 2)]).await.unwrap();
        pay(&store, &receipt).await;

        let refunded = |cents: u64| {
            stripe(
                "charge.refunded",
                &receipt.order_id,
                serde_json::json!({
                    "id": "ch_1",
                    "payment_intent": "pi_1",
                    "amount": receipt.total.cents(),
                    "amount_refunded": cents
                }),
            )
        };

        deliver(&store, &refunded(1_000)).await.unwrap();
        deliver(&store, &refunded(1_000)).await.unwrap();
        let partial = payment(&store, &receipt.order_id).await;
        assert_eq!(partial.refunds.len(), 1);
        assert_eq!(partial.status, PaymentStatus::PartiallyRefunded);

        deliver(&store, &refunded(4_900)).await.unwrap();
        let full = payment(&store, &receipt.order_id).await;
        assert_eq!(full.refunds.len(), 2);
        assert_eq!(full.refunds[1].amount, Money::from_cents(3_900));
        assert_eq!(full.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let store = store().await;
        let mut buyers = Vec::new();
        for i in 0..8 {
            let user = store
                .system
                .user_client
                .register(UserCreate::customer(format!("Buyer {i}"), format!("buyer{i}@example.com")))
                .await
                .unwrap();
            buyers.push(user.id);
        }

        let mut tasks = JoinSet::new();
        for user_id in buyers {
            let orders = store.system.order_client.clone();
            let lamp_id = store.lamp.id.clone();
            tasks.spawn(async move {
                orders
                    .place_order(
                        user_id,
                        vec![CartItem::new(lamp_id, 1)],
                        address(),
                        address(),
                        PaymentProvider::PayPal,
                    )
                    .await
            });
        }

        let mut placed = 0;
        let mut sold_out = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => placed += 1,
                Err(OrderError::InsufficientStock { .. }) => sold_out += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((placed, sold_out), (5, 3));
        assert_eq!(stock(&store, &store.lamp).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_refunds_never_overdraw() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 2)]).await.unwrap();
        pay(&store, &receipt).await;

        let mut tasks = JoinSet::new();
        for _ in 0..5 {
            let orders = store.system.order_client.clone();
            let admin = store.admin.clone();
            let order_id = receipt.order_id.clone();
            tasks.spawn(async move {
                orders
                    .refund_order(order_id, Money::from_cents(2_000), "goodwill".into(), &admin)
                    .await
            });
        }

        let mut granted = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => granted += 1,
                Err(OrderError::Payment(PaymentError::RefundExceedsBalance { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(granted, 2);
        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.refunded_total(), Money::from_cents(4_000));
        assert_eq!(payment.refundable_balance(), Money::from_cents(900));
    }

    #[tokio::test]
    async fn test_cart_rules() {
        let store = store().await;
        let carts = &store.system.cart_client;
        let user_id = store.customer.id.clone();

        let err = carts.add_item(user_id.clone(), store.lamp.id.clone(), 6).await.unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { requested: 6, available: 5, .. }));

        let err = carts.add_item("user_404".into(), store.lamp.id.clone(), 1).await.unwrap_err();
        assert_eq!(err, CartError::UnknownUser("user_404".into()));

        carts.add_item(user_id.clone(), store.lamp.id.clone(), 1).await.unwrap();
        carts.add_item(user_id.clone(), store.bulb.id.clone(), 3).await.unwrap();
        assert_eq!(carts.cart_total(user_id.clone()).await.unwrap(), Money::from_cents(3_500));

        let cart = carts
            .update_quantity(user_id.clone(), store.bulb.id.clone(), 0)
            .await
            .unwrap();
        assert_eq!(cart.items, vec![CartItem::new(store.lamp.id.clone(), 1)]);

        store
            .system
            .product_client
            .update_product(
                store.bulb.id.clone(),
                ProductPatch {
                    active: Some(false),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        let err = carts.add_item(user_id, store.bulb.id.clone(), 1).await.unwrap_err();
        assert_eq!(err, CartError::ProductUnavailable(store.bulb.id.clone()));
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_catalog_uniqueness_and_category_guard() {
        let store = store().await;
        let catalog = &store.system.product_client;

        let err = catalog
            .create_product(ProductCreate::new("LAMP-1", "Another Lamp", Money::from_cents(100), 1, &store.category.id))
            .await
            .unwrap_err();
        assert_eq!(err, ProductError::AlreadyExists("LAMP-1".into()));

        let err = catalog
            .create_product(ProductCreate::new("LAMP-2", "Lamp", Money::from_cents(100), 1, "category_404"))
            .await
            .unwrap_err();
        assert_eq!(err, ProductError::UnknownCategory("category_404".into()));

        let categories = &store.system.category_client;
        let err = categories.delete_category(store.category.id.clone()).await.unwrap_err();
        assert_eq!(
            err,
            CategoryError::InUse {
                id: store.category.id.clone(),
                products: 2,
            }
        );

        catalog.delete_product(store.lamp.id.clone()).await.unwrap();
        catalog.delete_product(store.bulb.id.clone()).await.unwrap();
        categories.delete_category(store.category.id.clone()).await.unwrap();
        assert!(categories.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_joins_actors() {
        let store = store().await;
        checkout(&store, &[(&store.bulb, 1)]).await.unwrap();
        assert!(store.system.shutdown().await.is_ok());
    }

    fn paypal(event_type: &str, order_id: &str, id: &str, value: &str) -> String {
        serde_json::json!({
            "event_type": event_type,
            "resource": {
                "id": id,
                "custom_id": order_id,
                "amount": { "currency_code": "USD", "value": value }
            }
        })
        .to_string()
    }

    async fn deliver_paypal(store: &Store, body: &str) -> Result<Order, OrderError> {
        let event = parse_webhook(PaymentProvider::PayPal, body).unwrap().unwrap();
        store.system.order_client.handle_payment_event(event).await
    }

    async fn paypal_checkout(store: &Store, items: &[(&Product, u32)]) -> CheckoutReceipt {
        for (product, quantity) in items {
            store
                .system
                .cart_client
                .add_item(store.customer.id.clone(), product.id.clone(), *quantity)
                .await
                .unwrap();
        }
        let mut request = checkout_request(&store.customer.id);
        request.provider = PaymentProvider::PayPal;
        store.system.order_client.checkout(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_success_after_cancellation_is_refunded() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 1)]).await.unwrap();

        let customer = Requester::from(&store.customer);
        store
            .system
            .order_client
            .transition(receipt.order_id.clone(), OrderStatus::Cancelled, None, &customer)
            .await
            .unwrap();
        assert!(payment(&store, &receipt.order_id).await.refunds.is_empty());

        let order = pay(&store, &receipt).await;
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.history.len(), 2);

        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refunds.len(), 1);
        assert_eq!(payment.refunds[0].amount, receipt.total);
        assert_eq!(payment.refunds[0].reason, "order cancelled");
    }

    #[tokio::test]
    async fn test_paypal_refund_drains_delivered_order() {
        let store = store().await;
        let receipt = paypal_checkout(&store, &[(&store.lamp, 2)]).await;
        assert_eq!(receipt.total, Money::from_cents(4_900));

        let order = deliver_paypal(&store, &paypal("PAYMENT.CAPTURE.COMPLETED", &receipt.order_id, "CAP-1", "49.00"))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        advance(
            &store,
            &receipt.order_id,
            &[OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered],
        )
        .await;

        let refunded = paypal("PAYMENT.CAPTURE.REFUNDED", &receipt.order_id, "REF-1", "49.00");
        let order = deliver_paypal(&store, &refunded).await.unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.history.last().unwrap().note.as_deref(), Some("refunded via paypal"));

        let err = deliver_paypal(&store, &refunded).await.unwrap_err();
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);
        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.refunds.len(), 1);
        assert_eq!(payment.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_paypal_partial_refund_keeps_order_delivered() {
        let store = store().await;
        let receipt = paypal_checkout(&store, &[(&store.lamp, 2)]).await;
        deliver_paypal(&store, &paypal("PAYMENT.CAPTURE.COMPLETED", &receipt.order_id, "CAP-1", "49.00"))
            .await
            .unwrap();
        advance(
            &store,
            &receipt.order_id,
            &[OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered],
        )
        .await;

        let order = deliver_paypal(&store, &paypal("PAYMENT.CAPTURE.REFUNDED", &receipt.order_id, "REF-1", "10.00"))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(payment.refundable_balance(), Money::from_cents(3_900));
    }

    #[tokio::test]
    async fn test_success_from_other_provider_or_amount_is_rejected() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.lamp, 2)]).await.unwrap();

        let err = deliver_paypal(&store, &paypal("PAYMENT.CAPTURE.COMPLETED", &receipt.order_id, "CAP-X", "0.01"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::Payment(PaymentError::ProviderMismatch {
                expected: PaymentProvider::Stripe,
                reported: PaymentProvider::PayPal,
            })
        );

        let short = stripe(
            "payment_intent.succeeded",
            &receipt.order_id,
            serde_json::json!({ "id": "pi_1", "amount": 1 }),
        );
        let err = deliver(&store, &short).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::Payment(PaymentError::AmountMismatch {
                expected: receipt.total,
                reported: Money::from_cents(1),
            })
        );
        assert_eq!(StoreError::from(err).status_code(), StatusCode::CONFLICT);

        let payment = payment(&store, &receipt.order_id).await;
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.transaction_id, None);
        let order = store.system.order_client.get_order(receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.history.len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_in_other_currency_is_rejected() {
        let store = store().await;
        let receipt = checkout(&store, &[(&store.bulb, 1)]).await.unwrap();

        let body = stripe(
            "payment_intent.succeeded",
            &receipt.order_id,
            serde_json::json!({ "id": "pi_1", "amount": receipt.total.cents(), "currency": "eur" }),
        );
        let err = deliver(&store, &body).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::Payment(PaymentError::CurrencyMismatch {
                expected: "USD".into(),
                reported: "EUR".into(),
            })
        );
        assert_eq!(payment(&store, &receipt.order_id).await.status, PaymentStatus::Pending);

        let body = stripe(
            "payment_intent.succeeded",
            &receipt.order_id,
            serde_json::json!({ "id": "pi_1", "amount": receipt.total.cents(), "currency": "usd" }),
        );
        assert_eq!(deliver(&store, &body).await.unwrap().status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_list_orders_by_status() {
        let store = store().await;
        let paid = checkout(&store, &[(&store.bulb, 1)]).await.unwrap();
        pay(&store, &paid).await;
        let open = checkout(&store, &[(&store.lamp, 1)]).await.unwrap();

        let orders = &store.system.order_client;
        let pending = orders.list_orders_by_status(Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(pending.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), [open.order_id.as_str()]);
        let confirmed = orders.list_orders_by_status(Some(OrderStatus::Confirmed)).await.unwrap();
        assert_eq!(confirmed.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), [paid.order_id.as_str()]);
        assert!(orders
            .list_orders_by_status(Some(OrderStatus::Shipped))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(orders.list_orders_by_status(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_checkout_for_unknown_user() {
        let store = store().await;
        let err = store
            .system
            .order_client
            .checkout(checkout_request("user_404"))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::InvalidUser("user_404".into()));
    }
}
