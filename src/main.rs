use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, info_span, Instrument};

use storefront::cli::{Cli, Command};
use storefront::domain::{
    Address, CategoryCreate, CheckoutRequest, Money, OrderStatus, PaymentProvider, ProductCreate, Requester,
    UserCreate,
};
use storefront::webhooks::parse_webhook;
use storefront::{setup_tracing, Config, StoreSystem};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.selected_command() {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Demo => {
            setup_tracing(&config.logging.level, cli.verbosity());
            run_demo(&config).await
        }
    }
}

/// Walks one order from checkout to a full refund.
async fn run_demo(config: &Config) -> Result<()> {
    info!("Starting storefront");
    let system = StoreSystem::new(config);

    let admin = system
        .user_client
        .register(UserCreate::admin("Grace", "grace@example.com"))
        .await?;
    let customer = system
        .user_client
        .register(UserCreate::customer("Alice", "Alice@Example.com"))
        .await?;
    let admin = Requester::from(&admin);
    info!(user_id = %customer.id, email = %customer.email, "Customer registered");

    let category = system
        .category_client
        .create_category(CategoryCreate::new("Lighting", "lighting"))
        .await?;
    let lamp = system
        .product_client
        .create_product(ProductCreate::new("LAMP-01", "Desk Lamp", "24.50".parse()?, 10, &category.id))
        .await?;
    let bulb = system
        .product_client
        .create_product(ProductCreate::new("BULB-02", "LED Bulb", Money::from_cents(399), 100, &category.id))
        .await?;

    system
        .cart_client
        .add_item(customer.id.clone(), lamp.id.clone(), 2)
        .await?;
    system
        .cart_client
        .add_item(customer.id.clone(), bulb.id.clone(), 4)
        .await?;

    let receipt = async {
        info!("Checking out");
        system
            .order_client
            .checkout(CheckoutRequest {
                user_id: customer.id.clone(),
                shipping_address: Address::new("Alice", "12 Elm St", "Portland", "97201", "US"),
                billing_address: None,
                provider: PaymentProvider::Stripe,
            })
            .await
    }
    .instrument(info_span!("checkout"))
    .await?;
    info!(order_id = %receipt.order_id, total = %receipt.total, "Order placed");

    let webhook = serde_json::json!({
        "id": "evt_demo",
        "type": "payment_intent.succeeded",
        "data": {"object": {
            "id": "pi_demo",
            "amount": receipt.total.cents(),
            "metadata": {"order_id": receipt.order_id},
        }},
    });
    if let Some(event) = parse_webhook(PaymentProvider::Stripe, &webhook.to_string())? {
        system
            .order_client
            .handle_payment_event(event)
            .instrument(info_span!("webhook"))
            .await?;
    }

    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        system
            .order_client
            .transition(receipt.order_id.clone(), status, None, &admin)
            .await?;
    }

    let partial = system
        .order_client
        .refund_order(
            receipt.order_id.clone(),
            Money::from_cents(1_000),
            "scratched lamp".to_string(),
            &admin,
        )
        .await?;
    info!(refund_id = %partial.id, amount = %partial.amount, "Partial refund issued");

    let order = system
        .order_client
        .transition(
            receipt.order_id.clone(),
            OrderStatus::Refunded,
            Some("returned".to_string()),
            &admin,
        )
        .await?;

    for row in &order.history {
        let from = row.from.map_or("-", OrderStatus::as_str);
        info!(from, to = %row.to, by = %row.changed_by, "History");
    }
    let lamp_stock = system.product_client.check_stock(lamp.id).await?;
    info!(lamp_stock, order_id = %order.id, status = %order.status, "Order finished");

    system.shutdown().await.map_err(anyhow::Error::msg)?;
    info!("Application completed successfully");
    Ok(())
}
