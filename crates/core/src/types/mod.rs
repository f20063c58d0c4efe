//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod shipping;

pub use id::{ProductId, ProductIdError};
pub use price::Price;
pub use shipping::ShippingInfo;
