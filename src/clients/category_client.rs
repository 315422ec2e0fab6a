use tracing::{info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::category_actor::CategoryError;
use crate::domain::{Category, CategoryCreate, CategoryPatch, Product};
use crate::validation::Validate;

/// Client for the Category actor. Reads products to guard deletes.
#[derive(Clone)]
pub struct CategoryClient {
    inner: ResourceClient<Category>,
    products: ResourceClient<Product>,
}

impl_client_methods!(CategoryClient, Category, CategoryError, category, categories);

impl CategoryClient {
    pub fn new(inner: ResourceClient<Category>, products: ResourceClient<Product>) -> Self {
        Self { inner, products }
    }

    #[instrument(skip(self, params), fields(slug = %params.slug))]
    pub async fn create_category(&self, params: CategoryCreate) -> Result<Category, CategoryError> {
        params.validate()?;
        let id = self.inner.create(params).await?;
        info!(category_id = %id, "Category created");
        self.inner.fetch(id).await
    }

    #[instrument(skip(self))]
    pub async fn update_category(&self, id: String, patch: CategoryPatch) -> Result<Category, CategoryError> {
        patch.validate()?;
        self.inner.update(id, patch).await
    }

    /// Deletes a category that no product is filed under.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: String) -> Result<(), CategoryError> {
        let category_id = id.clone();
        let products = self
            .products
            .list(move |product| product.category_id == category_id)
            .await
            .map_err(|e| CategoryError::ActorCommunicationError(e.to_string()))?;
        if !products.is_empty() {
            warn!(products = products.len(), "Category still in use");
            return Err(CategoryError::InUse {
                id,
                products: products.len(),
            });
        }
        self.inner.delete(id).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, CategoryError> {
        let slug = slug.to_string();
        let mut found = self.inner.list(move |category| category.slug == slug).await?;
        Ok(found.pop())
    }
}
