//! Integration tests for Emporium.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! No external services are needed. [`MockBackend`] serves the two backend
//! endpoints the storefront uses from an in-process axum router on an
//! ephemeral port, so the real `reqwest` clients are exercised end to end.
//!
//! # Test Categories
//!
//! - `catalog_api` - product lookup
//! - `coupon_api` - coupon validation, classification and debouncing
//! - `cart_persistence` - file-backed cart across restarts

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use emporium_storefront::ApiConfig;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Bearer token the mock expects from configured clients.
pub const TEST_TOKEN: &str = "test-token";

/// How the mock answers a coupon code.
#[derive(Debug, Clone)]
pub enum CouponReply {
    /// `200 {"success": true, "discountAmount": amount}` after `delay`.
    Discount { amount: i64, delay: Duration },
    /// `status {"success": false, "message": message}`.
    Failure { status: StatusCode, message: String },
    /// A raw body with the given status.
    Raw { status: StatusCode, body: String },
}

impl CouponReply {
    /// Immediate successful discount.
    #[must_use]
    pub const fn discount(amount: i64) -> Self {
        Self::Discount {
            amount,
            delay: Duration::ZERO,
        }
    }

    /// Successful discount answered after `delay`.
    #[must_use]
    pub const fn slow_discount(amount: i64, delay: Duration) -> Self {
        Self::Discount { amount, delay }
    }

    /// Rejection with a JSON message.
    #[must_use]
    pub fn failure(status: StatusCode, message: &str) -> Self {
        Self::Failure {
            status,
            message: message.to_string(),
        }
    }
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCoupon {
    pub code: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct MockState {
    products: HashMap<String, Value>,
    coupons: HashMap<String, CouponReply>,
    coupon_requests: Mutex<Vec<RecordedCoupon>>,
}

/// Builder for [`MockBackend`].
#[derive(Default)]
pub struct MockBackendBuilder {
    state: MockState,
}

impl MockBackendBuilder {
    /// Serve `product` (the inner object, with an `_id`) from the catalog.
    #[must_use]
    pub fn product(mut self, product: Value) -> Self {
        let id = product
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.state.products.insert(id, product);
        self
    }

    /// Answer `code` with `reply`. Unknown codes get a 404.
    #[must_use]
    pub fn coupon(mut self, code: &str, reply: CouponReply) -> Self {
        self.state.coupons.insert(code.to_string(), reply);
        self
    }

    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> std::io::Result<MockBackend> {
        let state = Arc::new(self.state);

        let app = Router::new()
            .route("/api/v1/product/{id}", get(get_product))
            .route("/api/v1/payment/coupon/apply", post(apply_coupon))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(MockBackend {
            base_url,
            state,
            server,
        })
    }
}

/// In-process stand-in for the shop backend.
///
/// The server stops when this is dropped.
pub struct MockBackend {
    base_url: Url,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    #[must_use]
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::default()
    }

    /// Base URL of the mock, with a trailing slash.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at this mock.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            token: Some(SecretString::from(TEST_TOKEN)),
            timeout: Duration::from_secs(5),
        }
    }

    /// Coupon requests received so far, oldest first.
    #[must_use]
    pub fn coupon_requests(&self) -> Vec<RecordedCoupon> {
        self.state
            .coupon_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A product payload the way the backend sends it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: i64, stock: u32) -> Value {
    json!({
        "_id": id,
        "name": name,
        "price": price,
        "imageUrl": format!("https://cdn.example.com/{id}.jpg"),
        "stock": stock,
    })
}

async fn get_product(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    match state.products.get(&id) {
        Some(product) => Json(json!({ "success": true, "product": product })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Product not found" })),
        )
            .into_response(),
    }
}

async fn apply_coupon(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let code = body
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state
        .coupon_requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedCoupon {
            code: code.clone(),
            authorization,
        });

    match state.coupons.get(&code) {
        Some(CouponReply::Discount { amount, delay }) => {
            tokio::time::sleep(*delay).await;
            Json(json!({
                "success": true,
                "discountAmount": amount,
                "message": format!("Coupon {code} applied"),
            }))
            .into_response()
        }
        Some(CouponReply::Failure { status, message }) => (
            *status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response(),
        Some(CouponReply::Raw { status, body }) => (*status, body.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Coupon not found" })),
        )
            .into_response(),
    }
}
