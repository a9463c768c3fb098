// HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use tracing::debug;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserResponse},
    service::AuthService,
};
use crate::response::{Created, ServiceResponse};

/// POST /api/auth/register
pub async fn register_handler(
    State(service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<Created<UserResponse>, AuthError> {
    debug!("Registering user {}", request.username);
    let user = service.register(request).await?;
    Ok(Created(ServiceResponse::with_message(
        "User registered successfully.",
        user,
    )))
}

/// POST /api/auth/login
pub async fn login_handler(
    State(service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ServiceResponse<AuthResponse>>, AuthError> {
    let tokens = service.login(request).await?;
    Ok(Json(ServiceResponse::with_message("Login successful.", tokens)))
}

/// POST /api/auth/refresh
pub async fn refresh_handler(
    State(service): State<AuthService>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ServiceResponse<AuthResponse>>, AuthError> {
    let tokens = service.refresh_tokens(&request.refresh_token).await?;
    Ok(Json(ServiceResponse::ok(tokens)))
}

/// POST /api/auth/logout
pub async fn logout_handler(
    State(service): State<AuthService>,
    user: AuthenticatedUser,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ServiceResponse<()>>, AuthError> {
    debug!("Logging out user {}", user.user_id);
    service.logout(&request.refresh_token).await?;
    Ok(Json(ServiceResponse::message("Logout successful.")))
}

/// GET /api/auth/me
pub async fn me_handler(
    State(service): State<AuthService>,
    user: AuthenticatedUser,
) -> Result<Json<ServiceResponse<UserResponse>>, AuthError> {
    let profile = service.get_current_user(user.user_id).await?;
    Ok(Json(ServiceResponse::ok(profile)))
}
