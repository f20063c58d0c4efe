//! Order drafts built from the cart at checkout.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::cart::{CartAction, CartState, CartStorage, CartStore, LineItem};
use crate::types::ShippingInfo;

/// Reasons checkout cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Shipping details missing: {}", .0.join(", "))]
    IncompleteShipping(Vec<&'static str>),
}

/// Order payload submitted once payment succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub order_items: Vec<LineItem>,
    pub shipping_address: ShippingInfo,
    pub sub_total: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub delivery: Decimal,
    pub discount: Decimal,
    pub total_price: Decimal,
}

impl OrderDraft {
    /// Build a draft from the cart state.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] for an empty cart or incomplete shipping
    /// details.
    pub fn from_state(state: &CartState) -> Result<Self, CheckoutError> {
        if state.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let missing = state.shipping_info.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::IncompleteShipping(missing));
        }

        let totals = &state.totals;
        Ok(Self {
            order_items: state.items.clone(),
            shipping_address: state.shipping_info.clone(),
            sub_total: totals.sub_total,
            shipping_price: totals.shipping,
            tax_price: totals.tax,
            delivery: totals.delivery,
            discount: totals.discount,
            total_price: totals.grand_total,
        })
    }
}

impl<S> CartStore<S> {
    /// Draft an order from the current cart.
    ///
    /// # Errors
    ///
    /// See [`OrderDraft::from_state`].
    pub fn checkout(&self) -> Result<OrderDraft, CheckoutError> {
        OrderDraft::from_state(self.state())
    }
}

impl<S: CartStorage> CartStore<S> {
    /// Record that the order was placed: empty the cart and forget the
    /// shipping details.
    pub fn complete_order(&mut self) {
        self.dispatch(CartAction::ClearCart);
        self.dispatch(CartAction::SaveShippingInfo(ShippingInfo::default()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ProductId;
    use crate::cart::{MemoryStorage, Product, Totals, keys};

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            address: "221B Baker Street".to_string(),
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            country: "India".to_string(),
            pin_code: "400001".to_string(),
        }
    }

    fn filled_store() -> CartStore<MemoryStorage> {
        let mut store = CartStore::rehydrate(MemoryStorage::default());
        store.dispatch(CartAction::AddItem(Product {
            id: ProductId::parse("a").unwrap(),
            name: "Kettle".to_string(),
            price: Decimal::new(100, 0),
            image_url: String::new(),
            stock: 10,
        }));
        store.dispatch(CartAction::ApplyDiscount(Decimal::new(10, 0)));
        store
    }

    #[test]
    fn test_empty_cart_cannot_checkout() {
        let store = CartStore::rehydrate(MemoryStorage::default());
        assert_eq!(store.checkout(), Err(CheckoutError::EmptyCart));
    }

    #[test]
    fn test_missing_shipping_fields() {
        let mut store = filled_store();
        let mut info = shipping();
        info.city.clear();
        store.dispatch(CartAction::SaveShippingInfo(info));

        let err = store.checkout().unwrap_err();
        assert_eq!(err, CheckoutError::IncompleteShipping(vec!["city"]));
        assert_eq!(err.to_string(), "Shipping details missing: city");
    }

    #[test]
    fn test_draft_carries_totals() {
        let mut store = filled_store();
        store.dispatch(CartAction::SaveShippingInfo(shipping()));

        let draft = store.checkout().unwrap();
        assert_eq!(draft.order_items.len(), 1);
        assert_eq!(draft.discount, Decimal::new(10, 0));
        assert_eq!(draft.total_price, Decimal::new(100 + 12 + 20 + 200 - 10, 0));

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["shippingAddress"]["pinCode"], "400001");
        assert_eq!(json["orderItems"][0]["_id"], "a");
        assert!(json.get("taxPrice").is_some());
    }

    #[test]
    fn test_complete_order_clears_everything() {
        let mut store = filled_store();
        store.dispatch(CartAction::SaveShippingInfo(shipping()));
        store.complete_order();

        assert!(store.is_empty());
        assert_eq!(store.totals(), &Totals::default());
        assert_eq!(store.shipping_info(), &ShippingInfo::default());
        assert_eq!(
            store.storage().get(keys::GRAND_TOTAL).unwrap().as_deref(),
            Some("0")
        );
    }
}
