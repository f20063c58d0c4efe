//! Product lookup.

use emporium_core::ProductId;
use emporium_core::cart::{Product, ProductError};
use reqwest::Method;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use super::{ApiError, BackendClient};

/// Errors returned by [`BackendClient::get_product`].
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this id.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The backend sent a product the cart cannot hold.
    #[error("Invalid product: {0}")]
    Invalid(#[from] ProductError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    product: Product,
}

impl BackendClient {
    /// Fetch a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] on 404, [`CatalogError::Invalid`]
    /// if the product fails validation and [`CatalogError::Api`] for
    /// transport, status or decoding failures.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let url = self.endpoint(&["api", "v1", "product", id.as_str()])?;

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(ApiError::from)?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id.clone()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = response.bytes().await.map_err(ApiError::from)?;
        let envelope: ProductEnvelope =
            serde_json::from_slice(&body).map_err(ApiError::from)?;

        Ok(envelope.product.validate()?)
    }
}
