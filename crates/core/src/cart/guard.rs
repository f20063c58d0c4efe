//! Stock-ceiling checks applied before an action reaches the store.
//!
//! The store itself accepts any quantity. Front ends call
//! [`CartStore::dispatch_guarded`] for user-initiated quantity changes so an
//! action that would break the ceiling is blocked and reported instead.

use thiserror::Error;

use super::{CartAction, CartStorage, CartStore};
use crate::types::ProductId;

/// Why a quantity change was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockWarning {
    #[error("{0} is out of stock")]
    OutOfStock(ProductId),
    #[error("you have reached the maximum stock limit")]
    MaximumReached(ProductId),
    #[error("you have reached the minimum stock limit")]
    MinimumReached(ProductId),
}

impl<S> CartStore<S> {
    /// Check `action` against the stock ceiling without applying it.
    ///
    /// # Errors
    ///
    /// Returns the [`StockWarning`] the UI should surface.
    pub fn check_stock(&self, action: &CartAction) -> Result<(), StockWarning> {
        match action {
            CartAction::AddItem(product) => match self.item(&product.id) {
                Some(item) if item.quantity >= product.stock => {
                    Err(StockWarning::MaximumReached(product.id.clone()))
                }
                None if product.stock == 0 => Err(StockWarning::OutOfStock(product.id.clone())),
                _ => Ok(()),
            },
            CartAction::Increment(id) => match self.item(id) {
                Some(item) if item.quantity >= item.stock_ceiling => {
                    Err(StockWarning::MaximumReached(id.clone()))
                }
                _ => Ok(()),
            },
            CartAction::Decrement(id) => match self.item(id) {
                Some(item) if item.quantity <= 1 => Err(StockWarning::MinimumReached(id.clone())),
                _ => Ok(()),
            },
            CartAction::RemoveItem(_)
            | CartAction::ClearCart
            | CartAction::ApplyDiscount(_)
            | CartAction::SaveShippingInfo(_) => Ok(()),
        }
    }
}

impl<S: CartStorage> CartStore<S> {
    /// Apply `action` only if it respects the stock ceiling.
    ///
    /// # Errors
    ///
    /// Returns a [`StockWarning`] and leaves the cart untouched when blocked.
    pub fn dispatch_guarded(&mut self, action: CartAction) -> Result<(), StockWarning> {
        self.check_stock(&action)?;
        self.dispatch(action);
        Ok(())
    }
}
