/// Edits applied to a cart inside its actor. Every action answers with the
/// cart as it looks afterwards.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Adds to the quantity already in the cart, or inserts a new line.
    AddItem { product_id: String, quantity: u32 },
    /// Replaces a line's quantity. Zero removes the line.
    SetQuantity { product_id: String, quantity: u32 },
    RemoveItem { product_id: String },
    Clear,
}
