//! Terminal output.

use emporium_core::Price;
use emporium_core::cart::CartStore;
use emporium_core::checkout::OrderDraft;

/// Print the cart's line items and totals.
#[allow(clippy::print_stdout)]
pub fn cart<S>(store: &CartStore<S>) {
    if store.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in store.items() {
        println!(
            "{:<24} {:>3} x {:>10} = {:>10}   ({})",
            item.name,
            item.quantity,
            Price::store(item.unit_price).to_string(),
            Price::store(item.line_total()).to_string(),
            item.id,
        );
    }

    let totals = store.totals();
    println!();
    println!("  Items      {}", totals.total_quantity);
    println!("  Subtotal   {}", Price::store(totals.sub_total));
    println!("  Tax        {}", Price::store(totals.tax));
    println!("  Shipping   {}", Price::store(totals.shipping));
    println!("  Delivery   {}", Price::store(totals.delivery));
    println!("  Discount  -{}", Price::store(totals.discount));
    println!("  Total      {}", Price::store(totals.grand_total));
}

/// Print the order payload as JSON.
#[allow(clippy::print_stdout)]
pub fn order(draft: &OrderDraft) {
    match serde_json::to_string_pretty(draft) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to encode order draft"),
    }
}

/// Print a stock warning.
#[allow(clippy::print_stdout)]
pub fn warning(warning: &impl std::fmt::Display) {
    println!("! {warning}");
}

/// Print a one-line message.
#[allow(clippy::print_stdout)]
pub fn notice(message: &str) {
    println!("{message}");
}
