//! Checkout commands.

use emporium_core::ShippingInfo;
use emporium_core::cart::{CartAction, CartStorage, CartStore};
use emporium_core::checkout::CheckoutError;
use tracing::info;

use crate::render;

/// Record shipping details and print the order draft.
///
/// # Errors
///
/// Returns [`CheckoutError`] if the cart is empty or a shipping field is
/// blank.
pub fn draft<S: CartStorage>(
    store: &mut CartStore<S>,
    info: ShippingInfo,
) -> Result<(), CheckoutError> {
    store.dispatch(CartAction::SaveShippingInfo(info));
    let draft = store.checkout()?;
    render::order(&draft);
    Ok(())
}

/// Clear the cart after the order has been placed.
pub fn complete<S: CartStorage>(store: &mut CartStore<S>) {
    let items = store.items().len();
    store.complete_order();
    info!(items, "Order complete, cart cleared");
    render::cart(store);
}
