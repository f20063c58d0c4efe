//! Cart editing commands.
//!
//! Quantity changes go through the stock guard, so a blocked change prints
//! the warning and leaves the cart as it was.

use emporium_core::ProductId;
use emporium_core::cart::{CartAction, CartStorage, CartStore};
use emporium_storefront::{BackendClient, CatalogError, StorefrontConfig};
use thiserror::Error;
use tracing::info;

use crate::render;

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error("Invalid product id: {0}")]
    InvalidId(#[from] emporium_core::ProductIdError),

    #[error("Not in cart: {0}")]
    NotInCart(ProductId),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Cannot reach the backend: {0}")]
    Client(#[from] emporium_storefront::ApiError),
}

/// Look up `id` on the backend and add one unit of it.
///
/// # Errors
///
/// Returns an error if the id is blank or the product cannot be fetched.
pub async fn add<S: CartStorage + Send>(
    store: &mut CartStore<S>,
    config: &StorefrontConfig,
    id: &str,
) -> Result<(), CartCommandError> {
    let id = ProductId::parse(id)?;
    let client = BackendClient::new(&config.api)?;
    let product = client.get_product(&id).await?;
    let name = product.name.clone();

    guarded(store, CartAction::AddItem(product), || {
        info!(product_id = %id, %name, "Added to cart");
    });
    Ok(())
}

/// Add one unit of an item already in the cart.
///
/// # Errors
///
/// Returns an error if the id is blank or not in the cart.
pub fn increment<S: CartStorage>(store: &mut CartStore<S>, id: &str) -> Result<(), CartCommandError> {
    let id = in_cart(store, id)?;
    guarded(store, CartAction::Increment(id), || {});
    Ok(())
}

/// Take one unit of an item out of the cart.
///
/// # Errors
///
/// Returns an error if the id is blank or not in the cart.
pub fn decrement<S: CartStorage>(store: &mut CartStore<S>, id: &str) -> Result<(), CartCommandError> {
    let id = in_cart(store, id)?;
    guarded(store, CartAction::Decrement(id), || {});
    Ok(())
}

/// Drop a line item entirely.
///
/// # Errors
///
/// Returns an error if the id is blank or not in the cart.
pub fn remove<S: CartStorage>(store: &mut CartStore<S>, id: &str) -> Result<(), CartCommandError> {
    let id = in_cart(store, id)?;
    store.dispatch(CartAction::RemoveItem(id.clone()));
    info!(product_id = %id, "Removed from cart");
    render::cart(store);
    Ok(())
}

/// Empty the cart.
pub fn clear<S: CartStorage>(store: &mut CartStore<S>) {
    store.dispatch(CartAction::ClearCart);
    info!("Cart cleared");
    render::cart(store);
}

fn in_cart<S>(store: &CartStore<S>, id: &str) -> Result<ProductId, CartCommandError> {
    let id = ProductId::parse(id)?;
    if store.item(&id).is_none() {
        return Err(CartCommandError::NotInCart(id));
    }
    Ok(id)
}

fn guarded<S: CartStorage>(
    store: &mut CartStore<S>,
    action: CartAction,
    on_applied: impl FnOnce(),
) {
    match store.dispatch_guarded(action) {
        Ok(()) => on_applied(),
        Err(warning) => render::warning(&warning),
    }
    render::cart(store);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::cart::{MemoryStorage, Product};
    use rust_decimal::Decimal;

    use super::*;

    fn store_with(stock: u32) -> CartStore<MemoryStorage> {
        let mut store = CartStore::rehydrate(MemoryStorage::default());
        store.dispatch(CartAction::AddItem(Product {
            id: ProductId::parse("lamp").unwrap(),
            name: "Lamp".to_string(),
            price: Decimal::new(100, 0),
            image_url: String::new(),
            stock,
        }));
        store
    }

    #[test]
    fn test_increment_respects_stock() {
        let mut store = store_with(2);
        increment(&mut store, "lamp").unwrap();
        increment(&mut store, "lamp").unwrap();
        assert_eq!(store.items()[0].quantity, 2);
    }

    #[test]
    fn test_decrement_stops_at_one() {
        let mut store = store_with(5);
        decrement(&mut store, "lamp").unwrap();
        assert_eq!(store.items()[0].quantity, 1);
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let mut store = store_with(5);
        let err = increment(&mut store, "kettle").unwrap_err();
        assert!(matches!(err, CartCommandError::NotInCart(_)));
        assert!(matches!(
            remove(&mut store, "  ").unwrap_err(),
            CartCommandError::InvalidId(_)
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = store_with(5);
        remove(&mut store, "lamp").unwrap();
        assert!(store.is_empty());

        let mut store = store_with(5);
        clear(&mut store);
        assert!(store.is_empty());
        assert_eq!(store.totals().grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_warning_leaves_cart_unchanged() {
        let mut store = store_with(1);
        let before = store.state().clone();
        guarded(&mut store, CartAction::Increment(ProductId::parse("lamp").unwrap()), || {
            unreachable!("blocked action reported as applied")
        });
        assert_eq!(store.state(), &before);
    }
}
