use chrono::{DateTime, Utc};

use super::actions::{OrderAction, OrderActionResult};
use super::OrderError;
use crate::actor_framework::Entity;
use crate::domain::{Order, OrderCreate, OrderStatus, OrderStatusHistory};

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Patch = ();
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderError;

    const KIND: &'static str = "order";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from creation parameters.
    ///
    /// # Notes
    /// The order starts `Pending`, with a history row that has no `from`.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        let placed = OrderStatusHistory {
            from: None,
            to: OrderStatus::Pending,
            note: None,
            changed_by: params.user_id.clone(),
            changed_at: params.placed_at,
        };
        Ok(Self {
            id,
            user_id: params.user_id,
            items: params.items,
            shipping_address: params.shipping_address,
            billing_address: params.billing_address,
            subtotal: params.subtotal,
            shipping: params.shipping,
            tax: params.tax,
            total: params.total,
            status: OrderStatus::Pending,
            history: vec![placed],
            created_at: params.placed_at,
            updated_at: params.placed_at,
        })
    }

    fn on_create(&mut self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        Ok(())
    }

    /// Orders change only through status transitions.
    fn on_update(&mut self, _patch: ()) -> Result<(), OrderError> {
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::Transition {
                to,
                note,
                changed_by,
                at,
            } => self.apply_transition(to, note, changed_by, at),
        }
    }
}

/// Rejects any pair outside the status table, self-transitions included.
pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}

impl Order {
    pub fn apply_transition(
        &mut self,
        to: OrderStatus,
        note: Option<String>,
        changed_by: String,
        at: DateTime<Utc>,
    ) -> Result<OrderActionResult, OrderError> {
        let from = self.status;
        ensure_transition(from, to)?;
        self.status = to;
        self.updated_at = at;
        self.history.push(OrderStatusHistory {
            from: Some(from),
            to,
            note,
            changed_by,
            changed_at: at,
        });
        Ok(OrderActionResult::Transitioned { from, to })
    }
}
