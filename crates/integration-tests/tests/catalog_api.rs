//! Product lookup against the mock backend.

use emporium_core::ProductId;
use emporium_core::cart::{CartAction, CartStore, MemoryStorage, ProductError};
use emporium_integration_tests::{MockBackend, product_json};
use emporium_storefront::{ApiError, BackendClient, CatalogError};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn test_get_product() {
    let backend = MockBackend::builder()
        .product(product_json("64f1", "Teak Chair", 300, 4))
        .start()
        .await
        .expect("Failed to start mock backend");
    let client = BackendClient::new(&backend.api_config()).expect("Failed to build client");

    let product = client
        .get_product(&ProductId::parse("64f1").expect("valid id"))
        .await
        .expect("Product lookup failed");

    assert_eq!(product.name, "Teak Chair");
    assert_eq!(product.price, Decimal::new(300, 0));
    assert_eq!(product.stock, 4);
    assert_eq!(product.image_url, "https://cdn.example.com/64f1.jpg");
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let backend = MockBackend::builder()
        .start()
        .await
        .expect("Failed to start mock backend");
    let client = BackendClient::new(&backend.api_config()).expect("Failed to build client");

    let err = client
        .get_product(&ProductId::parse("nope").expect("valid id"))
        .await
        .expect_err("Lookup should fail");

    assert!(matches!(err, CatalogError::NotFound(ref id) if id.as_str() == "nope"));
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let backend = MockBackend::builder()
        .product(product_json("broken", "Broken", -5, 1))
        .start()
        .await
        .expect("Failed to start mock backend");
    let client = BackendClient::new(&backend.api_config()).expect("Failed to build client");

    let err = client
        .get_product(&ProductId::parse("broken").expect("valid id"))
        .await
        .expect_err("Lookup should fail");

    assert!(matches!(
        err,
        CatalogError::Invalid(ProductError::NegativePrice(_))
    ));
}

#[tokio::test]
async fn test_malformed_product_is_parse_error() {
    let backend = MockBackend::builder()
        .product(json!({ "_id": "odd", "name": "Odd" , "price": "lots" }))
        .start()
        .await
        .expect("Failed to start mock backend");
    let client = BackendClient::new(&backend.api_config()).expect("Failed to build client");

    let err = client
        .get_product(&ProductId::parse("odd").expect("valid id"))
        .await
        .expect_err("Lookup should fail");

    assert!(matches!(err, CatalogError::Api(ApiError::Parse(_))));
}

#[tokio::test]
async fn test_fetched_product_goes_into_cart() {
    let backend = MockBackend::builder()
        .product(product_json("a", "Lamp", 100, 10))
        .start()
        .await
        .expect("Failed to start mock backend");
    let client = BackendClient::new(&backend.api_config()).expect("Failed to build client");
    let id = ProductId::parse("a").expect("valid id");

    let mut store = CartStore::rehydrate(MemoryStorage::default());
    for _ in 0..3 {
        let product = client.get_product(&id).await.expect("Product lookup failed");
        store.dispatch(CartAction::AddItem(product));
    }

    let totals = store.totals();
    assert_eq!(totals.total_quantity, 3);
    assert_eq!(totals.sub_total, Decimal::new(300, 0));
    assert_eq!(totals.grand_total, Decimal::new(532, 0));
}
