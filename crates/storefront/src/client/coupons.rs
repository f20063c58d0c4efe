//! Coupon validation endpoint.

use emporium_core::coupon::{AppliedCoupon, CouponError, CouponRequest, CouponResponse};
use reqwest::Method;
use tracing::{instrument, warn};

use super::BackendClient;
use crate::coupon::CouponService;

const GENERIC_FAILURE: &str = "Error applying coupon";

impl BackendClient {
    /// Ask the backend what `code` is worth.
    ///
    /// Transport failures and unreadable bodies are reported as
    /// [`CouponError::Validation`]; the detail goes to the log.
    ///
    /// # Errors
    ///
    /// Returns a classified [`CouponError`] when the coupon is not applied.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, code: &str) -> Result<AppliedCoupon, CouponError> {
        let url = self
            .endpoint(&["api", "v1", "payment", "coupon", "apply"])
            .map_err(|e| {
                warn!(error = %e, "Cannot build coupon endpoint");
                CouponError::Validation(GENERIC_FAILURE.to_string())
            })?;

        let response = self
            .request(Method::POST, url)
            .json(&CouponRequest { code })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Coupon request failed");
                CouponError::Validation(GENERIC_FAILURE.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Failed to read coupon response");
            CouponError::Validation(GENERIC_FAILURE.to_string())
        })?;

        match serde_json::from_slice::<CouponResponse>(&body) {
            Ok(parsed) if status.is_success() => parsed.into_result(code, Some(status.as_u16())),
            Ok(parsed) => Err(CouponError::classify(
                Some(status.as_u16()),
                parsed.message.as_deref(),
            )),
            Err(e) => {
                warn!(error = %e, status = status.as_u16(), "Unexpected coupon response body");
                Err(CouponError::classify(Some(status.as_u16()), None))
            }
        }
    }
}

impl CouponService for BackendClient {
    async fn validate(&self, code: &str) -> Result<AppliedCoupon, CouponError> {
        self.apply_coupon(code).await
    }
}
