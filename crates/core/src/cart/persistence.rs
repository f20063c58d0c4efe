//! Cart persistence over a string key-value cache.
//!
//! The cart is written one key per field (see [`keys`]): items as a JSON
//! array, every total as a plain decimal string. Restoring reads each key on
//! its own and substitutes a default for anything missing or unparsable, so
//! a damaged cache degrades to an empty cart instead of failing startup.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use super::{CartState, LineItem, PricingPolicy, Totals};

/// Cache keys, one per persisted field.
pub mod keys {
    pub const ITEMS: &str = "cart-items";
    pub const TOTAL_QUANTITY: &str = "cart-totalQuantity";
    pub const SUB_TOTAL: &str = "cart-subTotal";
    pub const DELIVERY: &str = "cart-delivery";
    pub const TAX: &str = "cart-tax";
    pub const SHIPPING: &str = "cart-shipping";
    pub const DISCOUNT: &str = "cart-discount";
    pub const GRAND_TOTAL: &str = "cart-grandTotal";

    /// Every key written by a snapshot.
    pub const ALL: [&str; 8] = [
        ITEMS,
        TOTAL_QUANTITY,
        SUB_TOTAL,
        DELIVERY,
        TAX,
        SHIPPING,
        DISCOUNT,
        GRAND_TOTAL,
    ];
}

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding a stored document failed.
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The backend refused the operation (e.g. quota exceeded).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable string key-value cache.
///
/// Backends may buffer writes; [`persist_snapshot`] calls
/// [`CartStorage::flush`] once after writing every key.
pub trait CartStorage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Make buffered writes durable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-memory storage. Nothing survives the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CartStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Write every persisted field of `state` to `storage`.
///
/// Shipping info is not written.
///
/// # Errors
///
/// Returns the first [`StorageError`] hit. Keys written before the failure
/// keep their new values.
pub fn persist_snapshot<S: CartStorage + ?Sized>(
    storage: &mut S,
    state: &CartState,
) -> Result<(), StorageError> {
    let totals = &state.totals;

    storage.set(keys::ITEMS, &serde_json::to_string(&state.items)?)?;
    storage.set(keys::TOTAL_QUANTITY, &totals.total_quantity.to_string())?;
    storage.set(keys::SUB_TOTAL, &totals.sub_total.to_string())?;
    storage.set(keys::DELIVERY, &totals.delivery.to_string())?;
    storage.set(keys::TAX, &totals.tax.to_string())?;
    storage.set(keys::SHIPPING, &totals.shipping.to_string())?;
    storage.set(keys::DISCOUNT, &totals.discount.to_string())?;
    storage.set(keys::GRAND_TOTAL, &totals.grand_total.to_string())?;
    storage.flush()
}

/// Items and totals read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredCart {
    pub items: Vec<LineItem>,
    pub totals: Totals,
}

/// Read a cart from `storage`, one key at a time.
///
/// Defaults for missing, unreadable or malformed keys:
///
/// | Key | Default |
/// |---|---|
/// | items | empty |
/// | tax | `policy.tax` |
/// | shipping | `policy.shipping_fee` |
/// | delivery | `policy.delivery_fee` |
/// | everything else | zero |
///
/// Items with a blank id, zero quantity or negative price are dropped, and
/// repeated ids keep only their first occurrence.
pub fn restore_snapshot<S: CartStorage + ?Sized>(
    storage: &S,
    policy: &PricingPolicy,
) -> RestoredCart {
    let items = read_items(storage);

    let totals = Totals {
        total_quantity: read_value(storage, keys::TOTAL_QUANTITY, 0, |s| s.parse().ok()),
        sub_total: read_amount(storage, keys::SUB_TOTAL, Decimal::ZERO),
        tax: read_amount(storage, keys::TAX, policy.tax),
        shipping: read_amount(storage, keys::SHIPPING, policy.shipping_fee),
        delivery: read_amount(storage, keys::DELIVERY, policy.delivery_fee),
        discount: read_amount(storage, keys::DISCOUNT, Decimal::ZERO),
        grand_total: read_amount(storage, keys::GRAND_TOTAL, Decimal::ZERO),
    };

    RestoredCart { items, totals }
}

fn read_items<S: CartStorage + ?Sized>(storage: &S) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = read_value(storage, keys::ITEMS, Vec::new(), |s| {
        serde_json::from_str(s).ok()
    });

    let before = items.len();
    let mut seen = HashSet::new();
    items.retain(|item| {
        !item.id.is_blank()
            && item.quantity > 0
            && item.unit_price >= Decimal::ZERO
            && seen.insert(item.id.clone())
    });
    if items.len() != before {
        warn!(
            dropped = before - items.len(),
            "Dropped invalid cached cart items"
        );
    }
    items
}

/// Non-negative decimal, or `default`.
fn read_amount<S: CartStorage + ?Sized>(storage: &S, key: &str, default: Decimal) -> Decimal {
    read_value(storage, key, default, |s| {
        s.parse::<Decimal>().ok().filter(|d| *d >= Decimal::ZERO)
    })
}

fn read_value<S, T, F>(storage: &S, key: &str, default: T, parse: F) -> T
where
    S: CartStorage + ?Sized,
    F: FnOnce(&str) -> Option<T>,
{
    match storage.get(key) {
        Ok(Some(raw)) => parse(raw.trim()).unwrap_or_else(|| {
            warn!(key, "Malformed cached value, using default");
            default
        }),
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "Failed to read cached value, using default");
            default
        }
    }
}
