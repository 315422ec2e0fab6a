use serde::{Deserialize, Serialize};

use super::Money;

/// Represents a product in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    /// Units on hand that are not reserved by an order.
    pub stock: u32,
    pub category_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub category_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub category_id: Option<String>,
    pub active: Option<bool>,
}

impl ProductCreate {
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            description: None,
            price,
            stock,
            category_id: category_id.into(),
        }
    }
}
