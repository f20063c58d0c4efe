//! Derived cart totals.
//!
//! Everything here is pure: the same items and discount always produce the
//! same [`Totals`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LineItem;

/// Fee schedule applied to a non-empty cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Flat tax charged on any non-empty cart.
    pub tax: Decimal,
    /// Flat shipping fee charged on any non-empty cart.
    pub shipping_fee: Decimal,
    /// Delivery fee charged below the free-delivery threshold.
    pub delivery_fee: Decimal,
    /// Total units at which delivery becomes free.
    pub free_delivery_threshold: u32,
}

impl PricingPolicy {
    /// The storefront's fee schedule: ₹12 tax, ₹20 shipping, ₹200 delivery,
    /// free delivery from 10 units.
    pub const STANDARD: Self = Self {
        tax: Decimal::from_parts(1200, 0, 0, false, 2),
        shipping_fee: Decimal::from_parts(2000, 0, 0, false, 2),
        delivery_fee: Decimal::from_parts(20000, 0, 0, false, 2),
        free_delivery_threshold: 10,
    };

    /// Derive totals for `items` with a requested discount of `discount_amount`.
    ///
    /// The discount is clamped into `0..=sub_total` and the grand total is
    /// floored at zero.
    #[must_use]
    pub fn compute(&self, items: &[LineItem], discount_amount: Decimal) -> Totals {
        let total_quantity = items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity));
        let sub_total: Decimal = items.iter().map(LineItem::line_total).sum();

        if total_quantity == 0 {
            return Totals {
                sub_total,
                ..Totals::default()
            };
        }

        let delivery = if total_quantity >= self.free_delivery_threshold {
            Decimal::ZERO
        } else {
            self.delivery_fee
        };
        let discount = discount_amount.max(Decimal::ZERO).min(sub_total);
        let grand_total = (sub_total + self.tax + self.shipping_fee + delivery - discount)
            .max(Decimal::ZERO);

        Totals {
            total_quantity,
            sub_total,
            tax: self.tax,
            shipping: self.shipping_fee,
            delivery,
            discount,
            grand_total,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Totals derived from the cart's line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_quantity: u32,
    pub sub_total: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub delivery: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
}

/// Compute totals under [`PricingPolicy::STANDARD`].
#[must_use]
pub fn compute_totals(items: &[LineItem], discount_amount: Decimal) -> Totals {
    PricingPolicy::STANDARD.compute(items, discount_amount)
}
