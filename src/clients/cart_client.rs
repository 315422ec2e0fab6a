use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::cart_actor::{CartAction, CartError};
use crate::clients::{ProductClient, UserClient};
use crate::domain::{Cart, CartCreate, Money, Product};
use crate::validation::{Validator, MAX_STOCK};

/// Client for the Cart actor.
///
/// Carts are created lazily, one per user, the first time an item is added.
#[derive(Clone)]
pub struct CartClient {
    inner: ResourceClient<Cart>,
    user_client: UserClient,
    product_client: ProductClient,
}

impl CartClient {
    pub fn new(inner: ResourceClient<Cart>, user_client: UserClient, product_client: ProductClient) -> Self {
        Self {
            inner,
            user_client,
            product_client,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: String) -> Result<Option<Cart>, CartError> {
        debug!("Sending request");
        let mut carts = self.inner.list(move |cart| cart.user_id == user_id).await?;
        Ok(carts.pop())
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: String, product_id: String, quantity: u32) -> Result<Cart, CartError> {
        let mut v = Validator::new();
        v.rule_for_number("quantity", u64::from(quantity)).range(1, MAX_STOCK);
        v.finish()?;

        self.ensure_user(&user_id).await?;
        let product = self.available_product(&product_id).await?;
        let cart = self.cart_for(&user_id).await?;
        let wanted = cart.quantity_of(&product_id).saturating_add(quantity);
        ensure_in_stock(&product, wanted)?;

        let cart = self
            .inner
            .perform_action(cart.id, CartAction::AddItem { product_id, quantity })
            .await?;
        info!(items = cart.item_count(), "Item added to cart");
        Ok(cart)
    }

    /// Sets a line's quantity; zero removes the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: String,
        product_id: String,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let cart = self.existing_cart(&user_id).await?;
        if quantity > 0 {
            let product = self.available_product(&product_id).await?;
            ensure_in_stock(&product, quantity)?;
        }
        self.inner
            .perform_action(cart.id, CartAction::SetQuantity { product_id, quantity })
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: String, product_id: String) -> Result<Cart, CartError> {
        let cart = self.existing_cart(&user_id).await?;
        self.inner
            .perform_action(cart.id, CartAction::RemoveItem { product_id })
            .await
    }

    /// Empties the user's cart. A user without a cart is left as is.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: String) -> Result<(), CartError> {
        if let Some(cart) = self.get_cart(user_id).await? {
            self.inner.perform_action(cart.id, CartAction::Clear).await?;
        }
        Ok(())
    }

    /// Subtotal of the cart at current product prices.
    #[instrument(skip(self))]
    pub async fn cart_total(&self, user_id: String) -> Result<Money, CartError> {
        let Some(cart) = self.get_cart(user_id).await? else {
            return Ok(Money::ZERO);
        };
        let mut total = Money::ZERO;
        for item in &cart.items {
            let product = self.product(&item.product_id).await?;
            total = product
                .price
                .checked_mul(item.quantity)
                .and_then(|line| total.checked_add(line))
                .ok_or(CartError::InvalidQuantity(item.quantity))?;
        }
        Ok(total)
    }

    async fn cart_for(&self, user_id: &str) -> Result<Cart, CartError> {
        if let Some(cart) = self.get_cart(user_id.to_string()).await? {
            return Ok(cart);
        }
        let created = self
            .inner
            .create(CartCreate {
                user_id: user_id.to_string(),
            })
            .await;
        match created {
            Ok(id) => self.inner.fetch(id).await,
            // Another request created it first.
            Err(CartError::AlreadyExists(_)) => self.existing_cart(user_id).await,
            Err(e) => Err(e),
        }
    }

    async fn existing_cart(&self, user_id: &str) -> Result<Cart, CartError> {
        self.get_cart(user_id.to_string())
            .await?
            .ok_or_else(|| CartError::NotFound(user_id.to_string()))
    }

    async fn ensure_user(&self, user_id: &str) -> Result<(), CartError> {
        let user = self
            .user_client
            .get_user(user_id.to_string())
            .await
            .map_err(|e| CartError::ActorCommunicationError(e.to_string()))?;
        if user.is_none() {
            warn!(user_id, "Unknown user");
            return Err(CartError::UnknownUser(user_id.to_string()));
        }
        Ok(())
    }

    async fn product(&self, product_id: &str) -> Result<Product, CartError> {
        self.product_client
            .get_product(product_id.to_string())
            .await
            .map_err(|e| CartError::ActorCommunicationError(e.to_string()))?
            .ok_or_else(|| CartError::UnknownProduct(product_id.to_string()))
    }

    async fn available_product(&self, product_id: &str) -> Result<Product, CartError> {
        let product = self.product(product_id).await?;
        if !product.active {
            return Err(CartError::ProductUnavailable(product_id.to_string()));
        }
        Ok(product)
    }
}

fn ensure_in_stock(product: &Product, wanted: u32) -> Result<(), CartError> {
    if wanted > product.stock {
        return Err(CartError::InsufficientStock {
            product_id: product.id.clone(),
            requested: wanted,
            available: product.stock,
        });
    }
    Ok(())
}
