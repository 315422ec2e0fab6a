use tracing::{debug, info, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Category, Product, ProductCreate, ProductPatch};
use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
use crate::validation::Validate;

/// Client for interacting with the Product actor.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
    categories: ResourceClient<Category>,
}

impl_client_methods!(ProductClient, Product, ProductError, product, products);

impl ProductClient {
    pub fn new(inner: ResourceClient<Product>, categories: ResourceClient<Category>) -> Self {
        Self { inner, categories }
    }

    #[instrument(skip(self, params), fields(sku = %params.sku))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<Product, ProductError> {
        params.validate()?;
        self.ensure_category(&params.category_id).await?;
        let id = self.inner.create(params).await?;
        info!(product_id = %id, "Product created");
        self.inner.fetch(id).await
    }

    #[instrument(skip(self))]
    pub async fn update_product(&self, id: String, patch: ProductPatch) -> Result<Product, ProductError> {
        patch.validate()?;
        if let Some(category_id) = &patch.category_id {
            self.ensure_category(category_id).await?;
        }
        self.inner.update(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: String) -> Result<(), ProductError> {
        debug!("Sending request");
        self.inner.delete(id).await
    }

    /// Active products, optionally narrowed to one category.
    #[instrument(skip(self))]
    pub async fn list_catalog(&self, category_id: Option<String>) -> Result<Vec<Product>, ProductError> {
        self.inner
            .list(move |product| {
                product.active && category_id.as_deref().map_or(true, |id| product.category_id == id)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: String) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::CheckStock).await? {
            ProductActionResult::StockLevel(level) => Ok(level),
            _ => Err(ProductError::ActorCommunicationError("Unexpected result".to_string())),
        }
    }

    /// Takes `quantity` units out of stock, returning what is left.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: String, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::ReserveStock(quantity)).await? {
            ProductActionResult::Reserved { remaining } => Ok(remaining),
            _ => Err(ProductError::ActorCommunicationError("Unexpected result".to_string())),
        }
    }

    /// Returns `quantity` units to stock, returning the new level.
    #[instrument(skip(self))]
    pub async fn release_stock(&self, id: String, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::ReleaseStock(quantity)).await? {
            ProductActionResult::Released { stock } => Ok(stock),
            _ => Err(ProductError::ActorCommunicationError("Unexpected result".to_string())),
        }
    }

    async fn ensure_category(&self, category_id: &str) -> Result<(), ProductError> {
        let category = self
            .categories
            .get(category_id.to_string())
            .await
            .map_err(|e| ProductError::ActorCommunicationError(e.to_string()))?;
        match category {
            Some(_) => Ok(()),
            None => Err(ProductError::UnknownCategory(category_id.to_string())),
        }
    }
}
