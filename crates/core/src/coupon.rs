//! Coupon validation schema and outcomes.
//!
//! The HTTP call lives in the storefront crate. This module owns the typed
//! response, the failure taxonomy shown to the shopper and the mapping of an
//! outcome onto the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartAction, CartStorage, CartStore};

/// Request body for the coupon endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponRequest<'a> {
    pub code: &'a str,
}

/// Response body from the coupon endpoint.
///
/// Error responses use the same shape with `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub success: bool,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A coupon the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_amount: Decimal,
    pub message: String,
}

/// Why a coupon was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Expired(String),
    #[error("{0}")]
    Validation(String),
}

impl CouponError {
    /// Classify a rejection from its HTTP status and message.
    ///
    /// 404 and messages mentioning "not found" or "invalid" are
    /// [`CouponError::NotFound`]; 410 and messages mentioning "expired" are
    /// [`CouponError::Expired`]; everything else is
    /// [`CouponError::Validation`].
    #[must_use]
    pub fn classify(status: Option<u16>, message: Option<&str>) -> Self {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("Error applying coupon")
            .to_owned();
        let lower = message.to_lowercase();

        if status == Some(410) || lower.contains("expired") {
            Self::Expired(message)
        } else if status == Some(404) || lower.contains("not found") || lower.contains("invalid")
        {
            Self::NotFound(message)
        } else {
            Self::Validation(message)
        }
    }

    /// The message to show the shopper.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m) | Self::Expired(m) | Self::Validation(m) => m,
        }
    }
}

impl CouponResponse {
    /// Turn a decoded response into an outcome for `code`.
    ///
    /// A missing `discountAmount` on success counts as zero; a negative one
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns a classified [`CouponError`] when `success` is false.
    pub fn into_result(self, code: &str, status: Option<u16>) -> Result<AppliedCoupon, CouponError> {
        if !self.success {
            return Err(CouponError::classify(status, self.message.as_deref()));
        }

        let discount_amount = self.discount_amount.unwrap_or(Decimal::ZERO);
        if discount_amount < Decimal::ZERO {
            return Err(CouponError::Validation(format!(
                "Coupon returned a negative discount ({discount_amount})"
            )));
        }

        Ok(AppliedCoupon {
            code: code.to_owned(),
            discount_amount,
            message: self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Coupon applied successfully!".to_owned()),
        })
    }
}

/// Trim and upper-case a user-entered code. `None` when blank.
#[must_use]
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

/// Final result of one coupon edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponOutcome {
    /// The code field was emptied.
    Cleared,
    Applied(AppliedCoupon),
    Rejected(CouponError),
}

impl CouponOutcome {
    /// Discount this outcome grants. Zero unless applied.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        match self {
            Self::Applied(coupon) => coupon.discount_amount,
            Self::Cleared | Self::Rejected(_) => Decimal::ZERO,
        }
    }
}

impl From<Result<AppliedCoupon, CouponError>> for CouponOutcome {
    fn from(result: Result<AppliedCoupon, CouponError>) -> Self {
        match result {
            Ok(coupon) => Self::Applied(coupon),
            Err(e) => Self::Rejected(e),
        }
    }
}

impl<S: CartStorage> CartStore<S> {
    /// Apply a coupon outcome: the granted amount on success, zero otherwise.
    pub fn apply_coupon(&mut self, outcome: &CouponOutcome) {
        self.dispatch(CartAction::ApplyDiscount(outcome.discount()));
    }
}
