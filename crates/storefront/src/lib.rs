//! Emporium storefront services.
//!
//! Everything the cart needs from the outside world: a client for the shop
//! backend, debounced coupon validation, a file-backed cart cache and the
//! environment configuration that wires them together. The cart itself
//! lives in `emporium-core` and never blocks on any of this.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod coupon;
pub mod storage;

pub use client::{ApiError, BackendClient, CatalogError};
pub use config::{ApiConfig, ConfigError, StorefrontConfig};
pub use coupon::{CouponService, CouponValidator};
pub use storage::FileStorage;
