use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::user;
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, MessageResponse,
};
use crate::services::users::{RegisterInput, UpdateProfileInput};
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for account endpoints
pub fn auth_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(get_user))
        .route("/logout", get(logout))
        .route("/password/update", put(update_password))
        .route("/profile/update", put(update_profile))
        .with_auth();

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset/:token", put(reset_password))
        .merge(protected)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub avatar: Option<Value>,
}

/// Envelope for endpoints that authenticate the caller and hand back a
/// fresh token.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: user::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub user: user::Model,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
    /// Plaintext reset token; delivery to the user's mailbox is handled by
    /// an external collaborator.
    pub reset_token: String,
}

fn issue_token(state: &AppState, account: &user::Model) -> Result<String, ApiError> {
    state
        .services
        .auth
        .generate_token(account)
        .map_err(|e| map_service_error(ServiceError::InternalError(e.to_string())))
}

/// Register a new shopper account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid payload or email taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let account = state
        .services
        .users
        .register(RegisterInput {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            password: payload.password,
        })
        .await
        .map_err(map_service_error)?;

    let token = issue_token(&state, &account)?;

    Ok(created_response(AuthResponse {
        success: true,
        message: "User registered successfully!".to_string(),
        token,
        user: account,
    }))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let account = state
        .services
        .users
        .authenticate(payload.email.trim(), &payload.password)
        .await
        .map_err(map_service_error)?;

    let token = issue_token(&state, &account)?;

    Ok(success_response(AuthResponse {
        success: true,
        message: "Logged in successfully!".to_string(),
        token,
        user: account,
    }))
}

/// Current account profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub(crate) async fn get_user(user: AuthUser, State(state): State<AppState>) -> Result<Response, ApiError> {
    let account = state
        .services
        .users
        .get_user(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UserResponse {
        success: true,
        user: account,
    }))
}

/// Log out. Tokens are stateless, so this simply acknowledges; clients
/// drop the token.
#[utoipa::path(
    get,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub(crate) async fn logout(_user: AuthUser) -> Result<Response, ApiError> {
    Ok(success_response(MessageResponse::new(
        "Logged out successfully.",
    )))
}

/// Start a password reset
#[utoipa::path(
    post,
    path = "/api/v1/auth/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset token issued", body = ForgotPasswordResponse),
        (status = 404, description = "No account with that email", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub(crate) async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let reset = state
        .services
        .users
        .forgot_password(payload.email.trim())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ForgotPasswordResponse {
        success: true,
        message: "Password reset token generated.".to_string(),
        reset_token: reset.token,
    }))
}

/// Redeem a reset token and set a new password
#[utoipa::path(
    put,
    path = "/api/v1/auth/password/reset/{token}",
    params(("token" = String, Path, description = "Reset token from the reset link")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset, logged in", body = AuthResponse),
        (status = 400, description = "Invalid or expired token", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub(crate) async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let account = state
        .services
        .users
        .reset_password(&token, &payload.password)
        .await
        .map_err(map_service_error)?;

    let token = issue_token(&state, &account)?;

    Ok(success_response(AuthResponse {
        success: true,
        message: "Password reset successfully!".to_string(),
        token,
        user: account,
    }))
}

/// Change the current password
#[utoipa::path(
    put,
    path = "/api/v1/auth/password/update",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Current password incorrect", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub(crate) async fn update_password(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    state
        .services
        .users
        .update_password(user.user_id, &payload.current_password, &payload.new_password)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MessageResponse::new(
        "Password updated successfully.",
    )))
}

/// Update name, email or avatar
#[utoipa::path(
    put,
    path = "/api/v1/auth/profile/update",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid payload or email taken", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub(crate) async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let account = state
        .services
        .users
        .update_profile(
            user.user_id,
            UpdateProfileInput {
                name: payload.name.map(|n| n.trim().to_string()),
                email: payload.email.map(|e| e.trim().to_lowercase()),
                avatar: payload.avatar,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UserResponse {
        success: true,
        user: account,
    }))
}
