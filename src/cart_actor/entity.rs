use super::actions::CartAction;
use super::CartError;
use crate::actor_framework::Entity;
use crate::domain::{Cart, CartCreate, CartItem};
use crate::validation::MAX_STOCK;

impl Entity for Cart {
    type Id = String;
    type CreateParams = CartCreate;
    type Patch = ();
    type Action = CartAction;
    type ActionResult = Cart;
    type Error = CartError;

    const KIND: &'static str = "cart";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: CartCreate) -> Result<Self, CartError> {
        Ok(Self {
            id,
            user_id: params.user_id,
            items: Vec::new(),
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.user_id.clone())
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), CartError> {
        Ok(())
    }

    fn handle_action(&mut self, action: CartAction) -> Result<Cart, CartError> {
        match action {
            CartAction::AddItem { quantity: 0, .. } => return Err(CartError::InvalidQuantity(0)),
            CartAction::AddItem { product_id, quantity } => {
                let current = self.quantity_of(&product_id);
                let total = current
                    .checked_add(quantity)
                    .filter(|total| u64::from(*total) <= MAX_STOCK)
                    .ok_or(CartError::InvalidQuantity(quantity))?;
                self.set_line(product_id, total);
            }
            CartAction::SetQuantity { product_id, quantity } => {
                if u64::from(quantity) > MAX_STOCK {
                    return Err(CartError::InvalidQuantity(quantity));
                }
                if self.quantity_of(&product_id) == 0 {
                    return Err(CartError::ItemNotInCart(product_id));
                }
                self.set_line(product_id, quantity);
            }
            CartAction::RemoveItem { product_id } => {
                if self.quantity_of(&product_id) == 0 {
                    return Err(CartError::ItemNotInCart(product_id));
                }
                self.set_line(product_id, 0);
            }
            CartAction::Clear => self.items.clear(),
        }
        Ok(self.clone())
    }
}

impl Cart {
    fn set_line(&mut self, product_id: String, quantity: u32) {
        if quantity == 0 {
            self.items.retain(|item| item.product_id != product_id);
            return;
        }
        match self.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.quantity = quantity,
            None => self.items.push(CartItem::new(product_id, quantity)),
        }
    }
}
