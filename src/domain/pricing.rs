use serde::Serialize;

use super::{Money, OrderItem};

/// How shipping and tax are charged on top of the item subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,
    pub flat_shipping: Money,
    /// Orders whose subtotal reaches this ship free. `None` disables it.
    pub free_shipping_threshold: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingPolicy {
    /// Prices a set of order lines. `None` means an amount overflowed.
    pub fn quote(&self, items: &[OrderItem]) -> Option<OrderTotals> {
        let lines = items.iter().map(OrderItem::line_total).collect::<Option<Vec<_>>>()?;
        let subtotal = Money::sum(lines)?;

        let ships_free = self
            .free_shipping_threshold
            .is_some_and(|threshold| subtotal >= threshold);
        let shipping = if ships_free || items.is_empty() {
            Money::ZERO
        } else {
            self.flat_shipping
        };

        let tax = subtotal.apply_basis_points(self.tax_rate_bps)?;
        let total = Money::sum([subtotal, shipping, tax])?;

        Some(OrderTotals {
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}
