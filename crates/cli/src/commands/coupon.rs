//! Coupon command.

use std::sync::Arc;

use emporium_core::cart::{CartStorage, CartStore};
use emporium_core::coupon::CouponOutcome;
use emporium_storefront::{ApiError, BackendClient, CouponValidator, StorefrontConfig};

use crate::render;

/// Feed `codes` to the coupon field one after another and apply whatever
/// the last one resolves to.
///
/// A rejected coupon is not an error: the discount is reset and the reason
/// printed.
///
/// # Errors
///
/// Returns an error if the backend client cannot be built.
pub async fn apply<S: CartStorage + Send>(
    store: &mut CartStore<S>,
    config: &StorefrontConfig,
    codes: &[String],
) -> Result<(), ApiError> {
    let client = BackendClient::new(&config.api)?;
    let mut validator = CouponValidator::new(Arc::new(client), config.coupon_debounce);

    for code in codes {
        validator.input(code);
    }

    if let Some(outcome) = validator.settle(store).await {
        match &outcome {
            CouponOutcome::Applied(coupon) => render::notice(&coupon.message),
            CouponOutcome::Rejected(e) => render::notice(e.message()),
            CouponOutcome::Cleared => render::notice("Coupon removed"),
        }
    }
    render::cart(store);
    Ok(())
}
