// HTTP handlers for user administration

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::{AuthAdmin, AuthError, AuthenticatedUser, UserResponse};
use crate::response::ServiceResponse;
use crate::users::{ListUsersQuery, UpdateUserRequest, UserService};

/// GET /api/users?role=
pub async fn list_users_handler(
    State(service): State<UserService>,
    AuthAdmin(_admin): AuthAdmin,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ServiceResponse<Vec<UserResponse>>>, AuthError> {
    let users = service.list(query.role).await?;
    Ok(Json(ServiceResponse::with_message(
        "Users retrieved successfully.",
        users,
    )))
}

/// GET /api/users/:id
pub async fn get_user_handler(
    State(service): State<UserService>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<UserResponse>>, AuthError> {
    let found = service.get(&user, id).await?;
    Ok(Json(ServiceResponse::with_message(
        "User retrieved successfully.",
        found,
    )))
}

/// PUT /api/users/:id
pub async fn update_user_handler(
    State(service): State<UserService>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ServiceResponse<UserResponse>>, AuthError> {
    let updated = service.update(&user, id, request).await?;
    Ok(Json(ServiceResponse::with_message(
        "User updated successfully.",
        updated,
    )))
}

/// DELETE /api/users/:id
pub async fn delete_user_handler(
    State(service): State<UserService>,
    AuthAdmin(admin): AuthAdmin,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<()>>, AuthError> {
    service.delete(&admin, id).await?;
    Ok(Json(ServiceResponse::message("User deleted successfully.")))
}
