use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::{product, user};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, MessageResponse,
};
use crate::services::catalog::{CreateProductInput, ProductFilter, UpdateProductInput};
use crate::services::reviews::{ReviewWithAuthor, SubmitReviewInput};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::AppState;

/// Custom validator for Decimal minimum value
fn validate_decimal_min_zero(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("decimal_min_zero"));
    }
    Ok(())
}

/// Creates the router for catalog, review and AI-search endpoints
pub fn product_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/admin/create", post(create_product))
        .route("/admin/update/:id", put(update_product))
        .route("/admin/delete/:id", delete(delete_product))
        .with_role(user::ROLE_ADMIN);

    let reviews = Router::new()
        .route("/review/new", put(submit_review))
        .route("/review/delete", delete(delete_review))
        .with_auth();

    Router::new()
        .route("/fetch", get(fetch_products))
        .route("/ai-search", post(ai_search))
        .route("/:id", get(get_product))
        .route("/:id/reviews", get(list_reviews))
        .merge(admin)
        .merge(reviews)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(custom = "validate_decimal_min_zero")]
    pub price: Decimal,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(range(min = 0))]
    pub stock: i32,
    /// Hosted image references (`[{url, public_id}, ...]`); uploading the
    /// binaries is an external concern
    #[serde(default)]
    pub images: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(custom = "validate_decimal_min_zero")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub images: Option<Value>,
}

/// Catalog filters; bracketed names follow the storefront's query-string
/// convention (`price[gte]=10&ratings[gte]=4`).
#[derive(Debug, Deserialize, IntoParams)]
pub struct FetchProductsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "price[gte]")]
    pub price_gte: Option<Decimal>,
    #[serde(rename = "price[lte]")]
    pub price_lte: Option<Decimal>,
    #[serde(rename = "ratings[gte]")]
    pub ratings_gte: Option<f64>,
    pub availability: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewQuery {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AiSearchRequest {
    #[validate(length(min = 1, max = 500))]
    pub prompt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub product: product::Model,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<product::Model>,
    pub total_products: u64,
    pub page: u64,
    pub per_page: u64,
}

/// A review together with its author's public profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ReviewAuthor>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<Value>,
}

impl From<ReviewWithAuthor> for ReviewView {
    fn from(row: ReviewWithAuthor) -> Self {
        Self {
            id: row.review.id,
            product_id: row.review.product_id,
            rating: row.review.rating,
            comment: row.review.comment,
            created_at: row.review.created_at,
            updated_at: row.review.updated_at,
            user: row.author.map(|author| ReviewAuthor {
                id: author.id,
                name: author.name,
                avatar: author.avatar,
            }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    pub success: bool,
    pub product: product::Model,
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewListResponse {
    pub success: bool,
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub success: bool,
    pub message: String,
    pub review: crate::entities::review::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AiSearchResponse {
    pub success: bool,
    /// Products the model judged to match the request, as returned by the
    /// model
    pub products: Vec<Value>,
}

/// Create a catalog product
#[utoipa::path(
    post,
    path = "/api/v1/product/admin/create",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub(crate) async fn create_product(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::ValidationError(
            "Product name cannot be blank".to_string(),
        ));
    }

    let item = state
        .services
        .catalog
        .create_product(
            user.user_id,
            CreateProductInput {
                name,
                description: payload.description,
                price: payload.price,
                category: payload.category.trim().to_string(),
                stock: payload.stock,
                images: payload.images.unwrap_or_else(|| Value::Array(vec![])),
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse {
        success: true,
        message: Some("Product created successfully!".to_string()),
        product: item,
    }))
}

/// Update a catalog product
#[utoipa::path(
    put,
    path = "/api/v1/product/admin/update/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub(crate) async fn update_product(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .catalog
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name.map(|n| n.trim().to_string()),
                description: payload.description,
                price: payload.price,
                category: payload.category.map(|c| c.trim().to_string()),
                stock: payload.stock,
                images: payload.images,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse {
        success: true,
        message: Some("Product updated successfully!".to_string()),
        product: item,
    }))
}

/// Delete a catalog product
#[utoipa::path(
    delete,
    path = "/api/v1/product/admin/delete/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub(crate) async fn delete_product(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .catalog
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new(
        "Product deleted successfully!",
    )))
}

/// Filtered catalog listing
#[utoipa::path(
    get,
    path = "/api/v1/product/fetch",
    params(FetchProductsQuery),
    responses(
        (status = 200, description = "Matching products", body = ProductListResponse)
    ),
    tag = "Products"
)]
pub(crate) async fn fetch_products(
    State(state): State<AppState>,
    Query(query): Query<FetchProductsQuery>,
) -> Result<Response, ApiError> {
    let page = state
        .services
        .catalog
        .fetch_products(ProductFilter {
            search: query.search,
            category: query.category,
            price_gte: query.price_gte,
            price_lte: query.price_lte,
            ratings_gte: query.ratings_gte,
            availability: query.availability,
            page: query.page,
        })
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductListResponse {
        success: true,
        products: page.products,
        total_products: page.total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Product detail with its reviews
#[utoipa::path(
    get,
    path = "/api/v1/product/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with reviews", body = ProductDetailResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .catalog
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    let reviews = state
        .services
        .reviews
        .list_reviews(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductDetailResponse {
        success: true,
        product: item,
        reviews: reviews.into_iter().map(ReviewView::from).collect(),
    }))
}

/// Reviews of a product
#[utoipa::path(
    get,
    path = "/api/v1/product/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Reviews, newest first", body = ReviewListResponse)
    ),
    tag = "Reviews"
)]
pub(crate) async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let reviews = state
        .services
        .reviews
        .list_reviews(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ReviewListResponse {
        success: true,
        reviews: reviews.into_iter().map(ReviewView::from).collect(),
    }))
}

/// Post or replace the caller's review
#[utoipa::path(
    put,
    path = "/api/v1/product/review/new",
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review saved", body = ReviewResponse),
        (status = 403, description = "No paid purchase of this product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub(crate) async fn submit_review(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let review = state
        .services
        .reviews
        .submit_review(
            user.user_id,
            SubmitReviewInput {
                product_id: payload.product_id,
                rating: payload.rating,
                comment: payload.comment,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ReviewResponse {
        success: true,
        message: "Review saved successfully!".to_string(),
        review,
    }))
}

/// Delete the caller's review
#[utoipa::path(
    delete,
    path = "/api/v1/product/review/delete",
    params(DeleteReviewQuery),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub(crate) async fn delete_review(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DeleteReviewQuery>,
) -> Result<Response, ApiError> {
    state
        .services
        .reviews
        .delete_review(user.user_id, query.product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new(
        "Review deleted successfully!",
    )))
}

/// Natural-language catalog filtering
#[utoipa::path(
    post,
    path = "/api/v1/product/ai-search",
    request_body = AiSearchRequest,
    responses(
        (status = 200, description = "Products matching the request", body = AiSearchResponse),
        (status = 502, description = "AI service unavailable or unparseable", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub(crate) async fn ai_search(
    State(state): State<AppState>,
    Json(payload): Json<AiSearchRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let candidates = state
        .services
        .catalog
        .all_products()
        .await
        .map_err(map_service_error)?;

    let products = state
        .services
        .ai
        .recommend(payload.prompt.trim(), &candidates)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(AiSearchResponse {
        success: true,
        products,
    }))
}
