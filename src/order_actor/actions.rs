use chrono::{DateTime, Utc};

use crate::domain::OrderStatus;

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves the order to `to` if the status table allows it, appending one
    /// history row.
    Transition {
        to: OrderStatus,
        note: Option<String>,
        changed_by: String,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActionResult {
    Transitioned { from: OrderStatus, to: OrderStatus },
}
