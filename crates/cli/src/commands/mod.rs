//! Subcommand implementations.

pub mod cart;
pub mod checkout;
pub mod coupon;
