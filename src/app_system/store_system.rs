use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actor_framework::{Entity, ResourceActor, ResourceClient};
use crate::clients::{CartClient, CategoryClient, OrderClient, PaymentClient, ProductClient, UserClient};
use crate::config::Config;
use crate::domain::{Cart, Category, Order, Payment, Product, User};

/// The storefront: one actor per resource plus the clients that drive them.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct StoreSystem {
    pub user_client: UserClient,
    pub category_client: CategoryClient,
    pub product_client: ProductClient,
    pub cart_client: CartClient,
    pub payment_client: PaymentClient,
    pub order_client: OrderClient,
    handles: Vec<JoinHandle<()>>,
}

/// Ids of the form `{prefix}_{n}`, counting from 1.
fn sequential_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || format!("{prefix}_{}", counter.fetch_add(1, Ordering::SeqCst))
}

fn spawn<T: Entity<Id = String>>(
    buffer_size: usize,
    prefix: &'static str,
    handles: &mut Vec<JoinHandle<()>>,
) -> ResourceClient<T> {
    let (actor, client) = ResourceActor::<T>::new(buffer_size, sequential_ids(prefix));
    handles.push(tokio::spawn(actor.run()));
    client
}

impl StoreSystem {
    /// Starts every actor. Must be called inside a Tokio runtime.
    pub fn new(config: &Config) -> Self {
        let buffer_size = config.actors.buffer_size;
        let mut handles = Vec::with_capacity(6);

        let users = spawn::<User>(buffer_size, "user", &mut handles);
        let categories = spawn::<Category>(buffer_size, "category", &mut handles);
        let products = spawn::<Product>(buffer_size, "product", &mut handles);
        let carts = spawn::<Cart>(buffer_size, "cart", &mut handles);
        let payments = spawn::<Payment>(buffer_size, "payment", &mut handles);
        let orders = spawn::<Order>(buffer_size, "order", &mut handles);

        let user_client = UserClient::new(users);
        let category_client = CategoryClient::new(categories.clone(), products.clone());
        let product_client = ProductClient::new(products, categories);
        let cart_client = CartClient::new(carts, user_client.clone(), product_client.clone());
        let payment_client = PaymentClient::new(
            payments,
            config.payments.providers.clone(),
            config.checkout.currency.as_str(),
        );
        let order_client = OrderClient::new(
            orders,
            user_client.clone(),
            product_client.clone(),
            cart_client.clone(),
            payment_client.clone(),
            config.checkout.policy(),
        );

        info!(actors = handles.len(), "Store system started");
        Self {
            user_client,
            category_client,
            product_client,
            cart_client,
            payment_client,
            order_client,
            handles,
        }
    }

    /// Drops every client and waits for the actors to drain.
    ///
    /// Actors stop once all senders are gone, so clones of the clients held
    /// elsewhere must be dropped first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        drop(self.order_client);
        drop(self.cart_client);
        drop(self.payment_client);
        drop(self.product_client);
        drop(self.category_client);
        drop(self.user_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
