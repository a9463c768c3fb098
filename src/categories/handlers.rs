// HTTP handlers for vehicle categories

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::AuthAdmin;
use crate::categories::{Category, CategoryRequest, CategoryService};
use crate::error::{ApiError, ErrorResponse};
use crate::response::{CategoryEnvelope, CategoryListEnvelope, Created, ServiceResponse};

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories ordered by name", body = CategoryListEnvelope),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(service): State<CategoryService>,
) -> Result<Json<ServiceResponse<Vec<Category>>>, ApiError> {
    tracing::debug!("Fetching all categories");
    let categories = service.list().await?;
    Ok(Json(ServiceResponse::with_message(
        "Categories retrieved successfully",
        categories,
    )))
}

/// Get one category
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = CategoryEnvelope),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category_handler(
    State(service): State<CategoryService>,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<Category>>, ApiError> {
    let category = service.get(id).await?;
    Ok(Json(ServiceResponse::with_message(
        "Category retrieved successfully",
        category,
    )))
}

/// Create a category (admin)
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryEnvelope),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Duplicate name", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(service): State<CategoryService>,
    _admin: AuthAdmin,
    Json(request): Json<CategoryRequest>,
) -> Result<Created<Category>, ApiError> {
    let category = service.create(request).await?;
    Ok(Created(ServiceResponse::with_message(
        "Category created successfully",
        category,
    )))
}

/// Rename a category (admin)
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryEnvelope),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Duplicate name", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(service): State<CategoryService>,
    _admin: AuthAdmin,
    Path(id): Path<i32>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<ServiceResponse<Category>>, ApiError> {
    let category = service.update(id, request).await?;
    Ok(Json(ServiceResponse::with_message(
        "Category updated successfully",
        category,
    )))
}

/// Delete an unused category (admin)
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still used by vehicles", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(service): State<CategoryService>,
    _admin: AuthAdmin,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<()>>, ApiError> {
    service.delete(id).await?;
    Ok(Json(ServiceResponse::message("Category deleted successfully")))
}
