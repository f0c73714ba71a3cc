use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "shopMate API",
        version = "0.1.0",
        description = r#"
# shopMate E-Commerce API

Backend for the shopMate storefront and admin dashboard.

## Features

- **Accounts**: registration, login, profile and password management
- **Catalog**: admin-managed products with keyword, category, price,
  rating and availability filters
- **Reviews**: purchase-verified product reviews with live average ratings
- **AI Search**: natural-language catalog filtering
- **Dashboard**: revenue, order, user and stock statistics for admins

## Authentication

Protected endpoints take a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Failures use a consistent envelope with appropriate HTTP status codes:

```json
{
  "success": false,
  "message": "Product not found."
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:4000", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Account and session endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Admin", description = "Admin dashboard endpoints")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::get_user,
        crate::handlers::auth::logout,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::reset_password,
        crate::handlers::auth::update_password,
        crate::handlers::auth::update_profile,

        // Products and reviews
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::fetch_products,
        crate::handlers::products::get_product,
        crate::handlers::products::list_reviews,
        crate::handlers::products::submit_review,
        crate::handlers::products::delete_review,
        crate::handlers::products::ai_search,

        // Admin
        crate::handlers::admin::get_all_users,
        crate::handlers::admin::delete_user,
        crate::handlers::admin::dashboard_stats,
    ),
    components(
        schemas(
            // Entities
            crate::entities::user::Model,
            crate::entities::product::Model,
            crate::entities::review::Model,

            // Auth types
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::ForgotPasswordRequest,
            crate::handlers::auth::ResetPasswordRequest,
            crate::handlers::auth::UpdatePasswordRequest,
            crate::handlers::auth::UpdateProfileRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            crate::handlers::auth::ForgotPasswordResponse,

            // Product and review types
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::products::SubmitReviewRequest,
            crate::handlers::products::AiSearchRequest,
            crate::handlers::products::ProductResponse,
            crate::handlers::products::ProductListResponse,
            crate::handlers::products::ProductDetailResponse,
            crate::handlers::products::ReviewView,
            crate::handlers::products::ReviewAuthor,
            crate::handlers::products::ReviewListResponse,
            crate::handlers::products::ReviewResponse,
            crate::handlers::products::AiSearchResponse,

            // Admin types
            crate::handlers::admin::UserListResponse,
            crate::handlers::admin::DashboardStatsResponse,
            crate::services::dashboard::DashboardStats,
            crate::services::dashboard::StatusCount,
            crate::services::dashboard::MonthlySales,
            crate::services::dashboard::TopSellingProduct,
            crate::services::dashboard::LowStockProduct,

            // Common types
            crate::handlers::common::MessageResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_core_paths() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("shopMate API"));
        assert!(json.contains("/api/v1/auth/register"));
        assert!(json.contains("/api/v1/product/fetch"));
        assert!(json.contains("/api/v1/admin/dashboard-stats"));
    }
}
