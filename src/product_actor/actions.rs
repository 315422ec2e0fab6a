/// Custom actions for Product entities.
///
/// These actions represent domain-specific operations that can be performed
/// on a product beyond standard CRUD operations.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Checks the current stock level without modifying it.
    CheckStock,
    /// Takes units out of stock for an order.
    ///
    /// # Errors
    /// Fails if the requested amount exceeds available stock or the product
    /// is inactive.
    ReserveStock(u32),
    /// Puts previously reserved units back, e.g. when an order is cancelled.
    ReleaseStock(u32),
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductActionResult {
    StockLevel(u32),
    Reserved { remaining: u32 },
    Released { stock: u32 },
}
