use super::actions::{ProductAction, ProductActionResult};
use super::ProductError;
use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductPatch};

impl Entity for Product {
    type Id = String;
    type CreateParams = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    const KIND: &'static str = "product";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new, active Product from creation parameters.
    fn from_create_params(id: String, params: ProductCreate) -> Result<Self, ProductError> {
        Ok(Self {
            id,
            sku: params.sku.trim().to_string(),
            name: params.name,
            description: params.description,
            price: params.price,
            stock: params.stock,
            category_id: params.category_id,
            active: true,
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.sku.clone())
    }

    fn on_update(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }

    /// Handles product-specific actions.
    ///
    /// # Actions
    /// - `CheckStock`: Returns the current stock level
    /// - `ReserveStock(amount)`: Decrements stock by the specified amount
    /// - `ReleaseStock(amount)`: Increments stock by the specified amount
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::StockLevel(self.stock)),
            ProductAction::ReserveStock(0) | ProductAction::ReleaseStock(0) => {
                Err(ProductError::InvalidQuantity(0))
            }
            ProductAction::ReserveStock(amount) => {
                if !self.active {
                    return Err(ProductError::Inactive(self.id.clone()));
                }
                if self.stock < amount {
                    return Err(ProductError::InsufficientStock {
                        product_id: self.id.clone(),
                        requested: amount,
                        available: self.stock,
                    });
                }
                self.stock -= amount;
                Ok(ProductActionResult::Reserved { remaining: self.stock })
            }
            ProductAction::ReleaseStock(amount) => {
                self.stock = self
                    .stock
                    .checked_add(amount)
                    .ok_or(ProductError::InvalidQuantity(amount))?;
                Ok(ProductActionResult::Released { stock: self.stock })
            }
        }
    }
}
