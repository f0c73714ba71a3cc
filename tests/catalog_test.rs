//! Integration tests for the product catalog: admin CRUD and the public
//! filtered listing.

mod common;

use axum::http::{Method, StatusCode};
use common::{expect_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn product_creation_is_admin_only() {
    let app = TestApp::new().await;
    let (_, user_token) = app
        .create_user("Shopper", "shopper@example.com", "shopper-password1")
        .await;

    let payload = json!({
        "name": "Standing Desk",
        "description": "Height adjustable desk",
        "price": "349.99",
        "category": "Furniture",
        "stock": 12
    });

    let response = app
        .request(
            Method::POST,
            "/api/v1/product/admin/create",
            Some(payload.clone()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/product/admin/create",
            Some(payload),
            Some(&user_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_updates_and_deletes_a_product() {
    let app = TestApp::new().await;
    let (_, admin_token) = app
        .create_admin("Admin", "admin@example.com", "admin-password-123")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/product/admin/create",
            Some(json!({
                "name": "Standing Desk",
                "description": "Height adjustable desk",
                "price": "349.99",
                "category": "Furniture",
                "stock": 12,
                "images": [{ "url": "https://cdn.example.com/desk.jpg", "public_id": "desk" }]
            })),
            Some(&admin_token),
        )
        .await;
    let body = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["product"]["ratings"], 0.0);
    let id = body["product"]["id"].as_str().expect("product id").to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/product/admin/update/{id}"),
            Some(json!({ "stock": 5, "price": "299.99" })),
            Some(&admin_token),
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["product"]["stock"], 5);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/product/admin/delete/{id}"),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/product/{id}"), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_product_returns_not_found_envelope() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/product/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;

    let body = expect_json(response, StatusCode::NOT_FOUND).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Product not found.");
}

#[tokio::test]
async fn fetch_filters_by_keyword_category_price_and_availability() {
    let app = TestApp::new().await;
    let (admin, _) = app
        .create_admin("Admin", "admin@example.com", "admin-password-123")
        .await;

    app.seed_product(admin.id, "Standing Desk", "Furniture", dec!(349.99), 12)
        .await;
    app.seed_product(admin.id, "Desk Lamp", "Lighting", dec!(39.99), 0)
        .await;
    app.seed_product(admin.id, "Office Chair", "Furniture", dec!(129.99), 4)
        .await;

    // Keyword matches name or description, regardless of case
    let response = app
        .request(Method::GET, "/api/v1/product/fetch?search=desk", None, None)
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 2);

    let response = app
        .request(Method::GET, "/api/v1/product/fetch?search=DESK", None, None)
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 2);

    // Category is an exact match
    let response = app
        .request(
            Method::GET,
            "/api/v1/product/fetch?category=Furniture",
            None,
            None,
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 2);

    // Price band
    let response = app
        .request(
            Method::GET,
            "/api/v1/product/fetch?price[gte]=100&price[lte]=200",
            None,
            None,
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 1);
    assert_eq!(body["products"][0]["name"], "Office Chair");

    // Availability
    let response = app
        .request(
            Method::GET,
            "/api/v1/product/fetch?availability=out-of-stock",
            None,
            None,
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 1);
    assert_eq!(body["products"][0]["name"], "Desk Lamp");

    let response = app
        .request(
            Method::GET,
            "/api/v1/product/fetch?availability=in-stock",
            None,
            None,
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 2);
}

#[tokio::test]
async fn fetch_rejects_unknown_availability_value() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/product/fetch?availability=backorder",
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ai_search_is_open_to_anonymous_shoppers() {
    let app = TestApp::new().await;

    // No API key is configured in the test environment, so the endpoint
    // answers 502 rather than 401: the route itself is public.
    let response = app
        .request(
            Method::POST,
            "/api/v1/product/ai-search",
            Some(json!({ "prompt": "a desk for a small office" })),
            None,
        )
        .await;

    let body = expect_json(response, StatusCode::BAD_GATEWAY).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "External API error: AI search is not configured.");
}

#[tokio::test]
async fn fetch_paginates_ten_per_page_newest_first() {
    let app = TestApp::new().await;
    let (admin, _) = app
        .create_admin("Admin", "admin@example.com", "admin-password-123")
        .await;

    for i in 0..12 {
        app.seed_product(admin.id, &format!("Widget {i}"), "Widgets", dec!(9.99), 3)
            .await;
    }

    let response = app
        .request(Method::GET, "/api/v1/product/fetch", None, None)
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["totalProducts"], 12);
    assert_eq!(body["products"].as_array().map(Vec::len), Some(10));
    assert_eq!(body["page"], 1);

    let response = app
        .request(Method::GET, "/api/v1/product/fetch?page=2", None, None)
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["products"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["page"], 2);
}
