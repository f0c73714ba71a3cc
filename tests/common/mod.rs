use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use shopmate_api::{
    config::AppConfig,
    db,
    entities::{order, order_item, product, user},
    services::catalog::CreateProductInput,
    services::users::RegisterInput,
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// Test harness: the full application router backed by a throwaway SQLite
/// database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _db_dir: TempDir,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("shopmate_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), Arc::new(cfg)).expect("failed to build state");
        let router = shopmate_api::app(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    /// Register a shopper account and return (account, token).
    pub async fn create_user(&self, name: &str, email: &str, password: &str) -> (user::Model, String) {
        let account = self
            .state
            .services
            .users
            .register(RegisterInput {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .expect("register test user");

        let token = self
            .state
            .services
            .auth
            .generate_token(&account)
            .expect("issue test token");

        (account, token)
    }

    /// Register an account and promote it to the Admin role.
    pub async fn create_admin(&self, name: &str, email: &str, password: &str) -> (user::Model, String) {
        let (account, _) = self.create_user(name, email, password).await;

        let mut active: user::ActiveModel = account.into();
        active.role = Set(user::ROLE_ADMIN.to_string());
        let account = active
            .update(&*self.state.db)
            .await
            .expect("promote test user");

        let token = self
            .state
            .services
            .auth
            .generate_token(&account)
            .expect("issue admin token");

        (account, token)
    }

    /// Seed a catalog product directly through the service layer.
    pub async fn seed_product(
        &self,
        created_by: Uuid,
        name: &str,
        category: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(
                created_by,
                CreateProductInput {
                    name: name.to_string(),
                    description: format!("{name} description"),
                    price,
                    category: category.to_string(),
                    stock,
                    images: json!([{ "url": "https://cdn.example.com/p.jpg", "public_id": "p" }]),
                },
            )
            .await
            .expect("seed product")
    }

    /// Seed an order with one line item, at a controlled creation time.
    pub async fn seed_order(
        &self,
        buyer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        total: Decimal,
        payment_status: &str,
        order_status: &str,
        created_at: DateTime<Utc>,
    ) -> order::Model {
        let placed = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            buyer_id: Set(buyer_id),
            order_status: Set(order_status.to_string()),
            total_price: Set(total),
            payment_status: Set(payment_status.to_string()),
            created_at: Set(created_at),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed order");

        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(placed.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(total),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed order item");

        placed
    }

    /// Send a request through the router, optionally with a bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

/// Decode a JSON response body.
#[allow(dead_code)]
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Assert status and decode the body in one step.
#[allow(dead_code)]
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    response_json(response).await
}
