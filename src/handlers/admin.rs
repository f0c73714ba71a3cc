use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::user;
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response, MessageResponse};
use crate::services::dashboard::DashboardStats;
use crate::services::users::USERS_PAGE_SIZE;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Creates the router for the admin dashboard. Every route requires the
/// Admin role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/getallusers", get(get_all_users))
        .route("/delete/:id", delete(delete_user))
        .route("/dashboard-stats", get(dashboard_stats))
        .with_role(user::ROLE_ADMIN)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    pub page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<user::Model>,
    pub total_users: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

/// Paged listing of shopper accounts
#[utoipa::path(
    get,
    path = "/api/v1/admin/getallusers",
    params(UserListQuery),
    responses(
        (status = 200, description = "Shopper accounts, newest first", body = UserListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn get_all_users(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Response, ApiError> {
    let page = state
        .services
        .users
        .list_customers(query.page.unwrap_or(1))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UserListResponse {
        success: true,
        users: page.users,
        total_users: page.total,
        page: page.page,
        per_page: USERS_PAGE_SIZE,
    }))
}

/// Delete a user account
#[utoipa::path(
    delete,
    path = "/api/v1/admin/delete/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn delete_user(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .users
        .delete_user(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new(
        "User deleted successfully!",
    )))
}

/// Aggregated dashboard figures
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard-stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStatsResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn dashboard_stats(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let stats = state
        .services
        .dashboard
        .dashboard_stats()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(DashboardStatsResponse {
        success: true,
        stats,
    }))
}
