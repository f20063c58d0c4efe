//! Emporium Core - cart pricing, persistence and checkout.
//!
//! This crate provides the shopping-cart logic shared by every Emporium
//! front end:
//! - `storefront` - HTTP clients, configuration and file-backed storage
//! - `cli` - Command-line shop front
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no network access, no
//! filesystem access. Persistence goes through the [`cart::CartStorage`]
//! trait so front ends choose their own durable cache.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for product ids, prices and shipping details
//! - [`cart`] - Totals calculator, cart store and persistence bridge
//! - [`coupon`] - Coupon response schema and failure taxonomy
//! - [`checkout`] - Order drafts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod types;

pub use types::*;
