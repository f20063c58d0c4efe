//! Client-side shopping cart.
//!
//! [`CartStore`] is a synchronous state machine: callers dispatch a
//! [`CartAction`], the store mutates its line items, recomputes [`Totals`]
//! through the [`PricingPolicy`] and writes the result to its
//! [`CartStorage`] backend before returning.
//!
//! # Example
//!
//! ```
//! use emporium_core::cart::{CartAction, CartStore, MemoryStorage, Product};
//! use emporium_core::ProductId;
//! use rust_decimal::Decimal;
//!
//! let mut store = CartStore::rehydrate(MemoryStorage::default());
//! let product = Product {
//!     id: ProductId::parse("p-1").unwrap(),
//!     name: "Linen shirt".to_string(),
//!     price: Decimal::new(100, 0),
//!     image_url: String::new(),
//!     stock: 5,
//! };
//! store.dispatch(CartAction::AddItem(product.clone()));
//! store.dispatch(CartAction::AddItem(product));
//!
//! assert_eq!(store.totals().total_quantity, 2);
//! assert_eq!(store.totals().sub_total, Decimal::new(200, 0));
//! ```

mod guard;
mod persistence;
mod totals;

pub use guard::StockWarning;
pub use persistence::{
    CartStorage, MemoryStorage, RestoredCart, StorageError, keys, persist_snapshot,
    restore_snapshot,
};
pub use totals::{PricingPolicy, Totals, compute_totals};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{ProductId, ShippingInfo};

// =============================================================================
// Products and line items
// =============================================================================

/// Errors raised when a product payload cannot become a line item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    /// The product has no usable identifier.
    #[error("product id cannot be empty")]
    BlankId,
    /// The product price is below zero.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// A product as returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Check the fields the cart relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] for a blank id or a negative price.
    pub fn validate(self) -> Result<Self, ProductError> {
        if self.id.is_blank() {
            return Err(ProductError::BlankId);
        }
        if self.price < Decimal::ZERO {
            return Err(ProductError::NegativePrice(self.id));
        }
        Ok(self)
    }
}

/// One product entry in the cart.
///
/// Serialized with the catalog's field names so cached items and product
/// payloads share a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "imageUrl", default)]
    pub image_ref: String,
    pub quantity: u32,
    #[serde(rename = "stock", default)]
    pub stock_ceiling: u32,
}

impl LineItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl From<Product> for LineItem {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            unit_price: product.price,
            image_ref: product.image_url,
            quantity: 1,
            stock_ceiling: product.stock,
        }
    }
}

// =============================================================================
// State and actions
// =============================================================================

/// Snapshot of the cart as seen by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Line items in insertion order, unique by id.
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub shipping_info: ShippingInfo,
}

/// Transitions accepted by [`CartStore::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit, appending the product if it is new.
    AddItem(Product),
    Increment(ProductId),
    /// Remove one unit; an item at quantity 1 leaves the cart.
    Decrement(ProductId),
    RemoveItem(ProductId),
    ClearCart,
    /// Apply a coupon amount; clamped to the subtotal.
    ApplyDiscount(Decimal),
    /// Record checkout shipping details. Not persisted.
    SaveShippingInfo(ShippingInfo),
}

// =============================================================================
// CartStore
// =============================================================================

/// The cart state machine.
///
/// Created once at startup with [`CartStore::rehydrate`] and handed to
/// whatever drives the UI. Every mutation runs to completion (mutate,
/// recompute, persist) before `dispatch` returns.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    /// Coupon amount as granted, before clamping to the subtotal.
    applied_discount: Decimal,
    policy: PricingPolicy,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Load the cart from `storage` under the standard pricing policy.
    pub fn rehydrate(storage: S) -> Self {
        Self::rehydrate_with_policy(storage, PricingPolicy::STANDARD)
    }

    /// Load the cart from `storage` under a custom pricing policy.
    ///
    /// Unreadable keys fall back to defaults (see [`restore_snapshot`]). The
    /// restored totals are then checked against the restored items and the
    /// policy; if any field disagrees, every total is recomputed from the
    /// items with the restored discount. A snapshot with no items therefore
    /// always comes back as an empty cart with zero totals.
    pub fn rehydrate_with_policy(storage: S, policy: PricingPolicy) -> Self {
        let RestoredCart { items, totals } = restore_snapshot(&storage, &policy);

        let expected = policy.compute(&items, totals.discount);
        let totals = if expected == totals {
            totals
        } else {
            if items.is_empty() && totals.total_quantity == 0 {
                debug!("No cached cart, starting empty");
            } else {
                warn!(
                    stored = ?totals,
                    recomputed = ?expected,
                    "Cached cart totals disagree with cached items, recomputing"
                );
            }
            expected
        };

        debug!(
            items = items.len(),
            total_quantity = totals.total_quantity,
            "Cart rehydrated"
        );

        Self {
            applied_discount: totals.discount,
            state: CartState {
                items,
                totals,
                shipping_info: ShippingInfo::default(),
            },
            policy,
            storage,
        }
    }

    /// Apply an action.
    ///
    /// Actions naming an id that is not in the cart, and `AddItem` with an
    /// invalid product, leave the state untouched and skip persistence.
    pub fn dispatch(&mut self, action: CartAction) {
        debug!(?action, "Cart action");

        match action {
            CartAction::AddItem(product) => {
                let product = match product.validate() {
                    Ok(product) => product,
                    Err(e) => {
                        warn!(error = %e, "Rejected product");
                        return;
                    }
                };
                if let Some(item) = self.item_mut(&product.id) {
                    item.quantity = item.quantity.saturating_add(1);
                } else {
                    self.state.items.push(LineItem::from(product));
                }
            }
            CartAction::Increment(id) => {
                let Some(item) = self.item_mut(&id) else {
                    return;
                };
                item.quantity = item.quantity.saturating_add(1);
            }
            CartAction::Decrement(id) => {
                let Some(item) = self.item_mut(&id) else {
                    return;
                };
                if item.quantity <= 1 {
                    self.state.items.retain(|item| item.id != id);
                } else {
                    item.quantity -= 1;
                }
            }
            CartAction::RemoveItem(id) => {
                let before = self.state.items.len();
                self.state.items.retain(|item| item.id != id);
                if self.state.items.len() == before {
                    return;
                }
            }
            CartAction::ClearCart => {
                self.state.items.clear();
                self.state.totals = Totals::default();
                self.applied_discount = Decimal::ZERO;
                self.persist();
                return;
            }
            CartAction::ApplyDiscount(amount) => {
                self.applied_discount = amount.max(Decimal::ZERO);
            }
            CartAction::SaveShippingInfo(info) => {
                self.state.shipping_info = info;
                return;
            }
        }

        self.state.totals = self.policy.compute(&self.state.items, self.applied_discount);
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = persist_snapshot(&mut self.storage, &self.state) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}

impl<S> CartStore<S> {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Line items in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.state.items
    }

    /// Current totals.
    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.state.totals
    }

    /// Shipping details recorded for this session.
    #[must_use]
    pub const fn shipping_info(&self) -> &ShippingInfo {
        &self.state.shipping_info
    }

    /// Look up a line item by product id.
    #[must_use]
    pub fn item(&self, id: &ProductId) -> Option<&LineItem> {
        self.state.items.iter().find(|item| &item.id == id)
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    /// Pricing policy in effect.
    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning its storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn item_mut(&mut self, id: &ProductId) -> Option<&mut LineItem> {
        self.state.items.iter_mut().find(|item| &item.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            name: format!("Product {id}"),
            price: Decimal::new(price, 0),
            image_url: format!("uploads/{id}.png"),
            stock,
        }
    }

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::rehydrate(MemoryStorage::default())
    }

    #[test]
    fn test_add_new_item_appends_with_quantity_one() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::AddItem(product("b", 50, 5)));

        let ids: Vec<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(store.items().iter().all(|i| i.quantity == 1));
        assert_eq!(store.totals().sub_total, Decimal::new(150, 0));
    }

    #[test]
    fn test_add_existing_item_increments() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.item(&id("a")).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_rejects_negative_price() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", -1, 5)));
        assert!(store.is_empty());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::Increment(id("a")));
        store.dispatch(CartAction::Increment(id("a")));
        assert_eq!(store.totals().total_quantity, 3);
        assert_eq!(store.totals().grand_total, Decimal::new(532, 0));

        store.dispatch(CartAction::Decrement(id("a")));
        assert_eq!(store.totals().total_quantity, 2);
    }

    #[test]
    fn test_decrement_at_one_removes_item() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::AddItem(product("b", 10, 5)));
        store.dispatch(CartAction::Decrement(id("a")));

        assert!(store.item(&id("a")).is_none());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.totals().sub_total, Decimal::new(10, 0));
    }

    #[test]
    fn test_actions_on_missing_id_are_noops() {
        let mut store = store();
        store.dispatch(CartAction::Increment(id("ghost")));
        store.dispatch(CartAction::Decrement(id("ghost")));
        store.dispatch(CartAction::RemoveItem(id("ghost")));

        assert!(store.is_empty());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_remove_item() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::Increment(id("a")));
        store.dispatch(CartAction::RemoveItem(id("a")));

        assert!(store.is_empty());
        assert_eq!(store.totals(), &Totals::default());
    }

    #[test]
    fn test_clear_cart_is_idempotent() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::ApplyDiscount(Decimal::new(30, 0)));

        store.dispatch(CartAction::ClearCart);
        let once = store.state().clone();
        store.dispatch(CartAction::ClearCart);

        assert_eq!(store.state(), &once);
        assert!(once.items.is_empty());
        assert_eq!(once.totals, Totals::default());
    }

    #[test]
    fn test_clear_cart_resets_applied_discount() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::ApplyDiscount(Decimal::new(30, 0)));
        store.dispatch(CartAction::ClearCart);
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));

        assert_eq!(store.totals().discount, Decimal::ZERO);
    }

    #[test]
    fn test_discount_clamps_and_recovers_with_subtotal() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::ApplyDiscount(Decimal::new(150, 0)));
        assert_eq!(store.totals().discount, Decimal::new(100, 0));

        store.dispatch(CartAction::Increment(id("a")));
        assert_eq!(store.totals().discount, Decimal::new(150, 0));
        assert_eq!(store.totals().grand_total, Decimal::new(200 + 12 + 20 + 200 - 150, 0));
    }

    #[test]
    fn test_discount_over_subtotal_floors_grand_total() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::Increment(id("a")));
        store.dispatch(CartAction::Increment(id("a")));
        store.dispatch(CartAction::ApplyDiscount(Decimal::new(500, 0)));

        assert_eq!(store.totals().discount, Decimal::new(300, 0));
        assert_eq!(store.totals().grand_total, Decimal::new(232, 0));
    }

    #[test]
    fn test_shipping_info_not_persisted() {
        let mut store = store();
        let info = ShippingInfo {
            city: "Pune".to_string(),
            ..Default::default()
        };
        store.dispatch(CartAction::SaveShippingInfo(info.clone()));

        assert_eq!(store.shipping_info(), &info);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        assert_eq!(
            store.storage().get(keys::TOTAL_QUANTITY).unwrap().as_deref(),
            Some("1")
        );

        store.dispatch(CartAction::Increment(id("a")));
        assert_eq!(
            store.storage().get(keys::TOTAL_QUANTITY).unwrap().as_deref(),
            Some("2")
        );

        store.dispatch(CartAction::ClearCart);
        assert_eq!(
            store.storage().get(keys::ITEMS).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_rehydrate_round_trip() {
        let mut store = store();
        store.dispatch(CartAction::AddItem(product("a", 100, 5)));
        store.dispatch(CartAction::AddItem(product("b", 35, 9)));
        store.dispatch(CartAction::Increment(id("b")));
        store.dispatch(CartAction::ApplyDiscount(Decimal::new(40, 0)));
        let before = store.state().clone();

        let reloaded = CartStore::rehydrate(store.into_storage());
        assert_eq!(reloaded.items(), before.items.as_slice());
        assert_eq!(reloaded.totals(), &before.totals);
    }

    #[test]
    fn test_rehydrate_recomputes_inconsistent_totals() {
        let mut storage = MemoryStorage::default();
        let items = vec![LineItem::from(product("a", 100, 5))];
        storage
            .set(keys::ITEMS, &serde_json::to_string(&items).unwrap())
            .unwrap();
        storage.set(keys::TOTAL_QUANTITY, "7").unwrap();

        let store = CartStore::rehydrate(storage);
        assert_eq!(store.totals().total_quantity, 1);
        assert_eq!(store.totals().grand_total, Decimal::new(332, 0));
    }

    #[test]
    fn test_rehydrate_clamps_cached_discount() {
        let mut storage = MemoryStorage::default();
        let mut line = LineItem::from(product("a", 100, 5));
        line.quantity = 3;
        storage
            .set(keys::ITEMS, &serde_json::to_string(&vec![line]).unwrap())
            .unwrap();
        storage.set(keys::TOTAL_QUANTITY, "3").unwrap();
        storage.set(keys::SUB_TOTAL, "300").unwrap();
        storage.set(keys::DISCOUNT, "999").unwrap();
        storage.set(keys::GRAND_TOTAL, "7").unwrap();

        let mut store = CartStore::rehydrate(storage);
        assert_eq!(store.totals().discount, Decimal::new(300, 0));
        assert_eq!(store.totals().grand_total, Decimal::new(232, 0));

        // The clamped amount is what carries over to later actions.
        store.dispatch(CartAction::Increment(id("a")));
        assert_eq!(store.totals().discount, Decimal::new(300, 0));
        assert_eq!(store.totals().grand_total, Decimal::new(400 + 12 + 20 + 200 - 300, 0));
    }

    #[test]
    fn test_rehydrate_without_snapshot_is_zeroed() {
        let store = store();
        assert!(store.is_empty());
        assert_eq!(store.totals(), &Totals::default());
    }

    fn assert_consistent(totals: &Totals, items: &[LineItem]) {
        let quantity: u32 = items.iter().map(|i| i.quantity).sum();
        let sub_total: Decimal = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        assert!(items.iter().all(|i| i.unit_price >= Decimal::ZERO));
        assert_eq!(totals.total_quantity, quantity);
        assert_eq!(totals.sub_total, sub_total);
        assert!(totals.discount >= Decimal::ZERO);
        assert!(totals.discount <= totals.sub_total);
        let grand = (totals.sub_total + totals.tax + totals.shipping + totals.delivery
            - totals.discount)
            .max(Decimal::ZERO);
        assert_eq!(totals.grand_total, grand);
    }

    #[test]
    fn test_rehydrate_tampered_keys_stay_consistent() {
        let mut seed = store();
        seed.dispatch(CartAction::AddItem(product("a", 100, 5)));
        seed.dispatch(CartAction::AddItem(product("b", 35, 9)));
        seed.dispatch(CartAction::Increment(id("b")));
        seed.dispatch(CartAction::ApplyDiscount(Decimal::new(40, 0)));
        let snapshot = seed.into_storage();

        let negative_item = r#"[{"_id":"a","name":"A","price":"-50","quantity":2,"stock":5}]"#;
        let tampered_values = ["-50", "0", "999", "abc", "", "1e3", negative_item];

        for key in keys::ALL {
            for value in tampered_values {
                let mut storage = snapshot.clone();
                storage.set(key, value).unwrap();

                let mut store = CartStore::rehydrate(storage);
                assert_consistent(store.totals(), store.items());

                store.dispatch(CartAction::ApplyDiscount(Decimal::new(10, 0)));
                assert_consistent(store.totals(), store.items());
            }
        }
    }

    #[test]
    fn test_product_payload_parses_numeric_price() {
        let json = r#"{"_id":"p1","name":"Mug","price":249.5,"imageUrl":"uploads\\mug.png","stock":3,"category":"kitchen"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Decimal::new(2495, 1));
        assert_eq!(product.stock, 3);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_product_validate_blank_id() {
        let json = r#"{"_id":" ","name":"Mug","price":"10"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.validate(), Err(ProductError::BlankId));
    }
}
