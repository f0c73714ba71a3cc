/*!
 * shopMate API: REST backend for the shopMate e-commerce platform.
 *
 * Serves the storefront and the admin dashboard: accounts and JWT auth,
 * the product catalog with filtered listing, purchase-verified reviews,
 * an AI-assisted natural-language product filter, and admin statistics.
 */

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::services::{
    AiRecommendationService, DashboardService, ProductCatalogService, ReviewService,
    UserAccountService,
};
use axum::{routing::get, Extension, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Service container shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub users: UserAccountService,
    pub catalog: ProductCatalogService,
    pub reviews: ReviewService,
    pub dashboard: DashboardService,
    pub ai: AiRecommendationService,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Result<Self, ServiceError> {
        let auth = Arc::new(AuthService::new(AuthConfig::new(
            config.jwt_secret.clone(),
            Duration::from_secs(config.jwt_expiration as u64),
        )));

        let services = AppServices {
            auth,
            users: UserAccountService::new(db.clone()),
            catalog: ProductCatalogService::new(db.clone()),
            reviews: ReviewService::new(db.clone()),
            dashboard: DashboardService::new(db.clone()),
            ai: AiRecommendationService::new(&config)?,
        };

        Ok(Self {
            db,
            config,
            services,
        })
    }
}

/// All versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/product", handlers::products::product_routes())
        .nest("/admin", handlers::admin::admin_routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "service": "shopmate-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds the full application router on top of the given state.
pub fn app(state: AppState) -> Router {
    let auth_service = state.services.auth.clone();

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(Extension(auth_service))
        .with_state(state)
}
