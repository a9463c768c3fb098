// HTTP handlers for the vehicle catalogue

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::{AuthAdmin, MaybeUser};
use crate::error::{ApiError, ErrorResponse};
use crate::pagination::PagedResult;
use crate::query::VehicleQuery;
use crate::response::{Created, ServiceResponse, VehicleEnvelope, VehicleListEnvelope, VehiclePageEnvelope};
use crate::vehicles::{Vehicle, VehicleRequest, VehicleService};

/// Browse the catalogue with search, filters, sorting and paging
#[utoipa::path(
    get,
    path = "/api/vehicles",
    params(VehicleQuery),
    responses(
        (status = 200, description = "One page of vehicles", body = VehiclePageEnvelope),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "vehicles"
)]
pub async fn list_vehicles_handler(
    State(service): State<VehicleService>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<ServiceResponse<PagedResult<Vehicle>>>, ApiError> {
    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());
    let page = service.browse(query, is_admin).await?;
    Ok(Json(ServiceResponse::with_message(
        format!("Found {} vehicles", page.total_count),
        page,
    )))
}

/// Get one vehicle
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle found", body = VehicleEnvelope),
        (status = 404, description = "Vehicle not found", body = ErrorResponse)
    ),
    tag = "vehicles"
)]
pub async fn get_vehicle_handler(
    State(service): State<VehicleService>,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<Vehicle>>, ApiError> {
    let vehicle = service.get(id).await?;
    Ok(Json(ServiceResponse::ok(vehicle)))
}

/// Non-deleted vehicles of one category
#[utoipa::path(
    get,
    path = "/api/categories/{id}/vehicles",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Vehicles in the category", body = VehicleListEnvelope),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "vehicles"
)]
pub async fn list_category_vehicles_handler(
    State(service): State<VehicleService>,
    Path(category_id): Path<i32>,
) -> Result<Json<ServiceResponse<Vec<Vehicle>>>, ApiError> {
    let vehicles = service.list_by_category(category_id).await?;
    Ok(Json(ServiceResponse::ok(vehicles)))
}

/// Add a vehicle to the catalogue (admin)
#[utoipa::path(
    post,
    path = "/api/vehicles",
    request_body = VehicleRequest,
    responses(
        (status = 201, description = "Vehicle created", body = VehicleEnvelope),
        (status = 400, description = "Validation failed or invalid category", body = ErrorResponse),
        (status = 409, description = "Duplicate model, version and color", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn create_vehicle_handler(
    State(service): State<VehicleService>,
    _admin: AuthAdmin,
    Json(request): Json<VehicleRequest>,
) -> Result<Created<Vehicle>, ApiError> {
    let vehicle = service.create(request).await?;
    Ok(Created(ServiceResponse::with_message(
        "Vehicle created successfully",
        vehicle,
    )))
}

/// Replace a vehicle's details (admin)
#[utoipa::path(
    put,
    path = "/api/vehicles/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    request_body = VehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = VehicleEnvelope),
        (status = 404, description = "Vehicle not found", body = ErrorResponse),
        (status = 409, description = "Duplicate model, version and color", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn update_vehicle_handler(
    State(service): State<VehicleService>,
    _admin: AuthAdmin,
    Path(id): Path<i32>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<ServiceResponse<Vehicle>>, ApiError> {
    let vehicle = service.update(id, request).await?;
    Ok(Json(ServiceResponse::with_message(
        "Vehicle updated successfully",
        vehicle,
    )))
}

/// Soft-delete a vehicle (admin)
#[utoipa::path(
    delete,
    path = "/api/vehicles/{id}",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle deleted"),
        (status = 400, description = "Vehicle missing or already deleted", body = ErrorResponse),
        (status = 409, description = "Vehicle has active appointments", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn delete_vehicle_handler(
    State(service): State<VehicleService>,
    _admin: AuthAdmin,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<()>>, ApiError> {
    service.soft_delete(id).await?;
    Ok(Json(ServiceResponse::message("Vehicle deleted successfully")))
}

/// Undo a soft delete (admin)
#[utoipa::path(
    post,
    path = "/api/vehicles/{id}/restore",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle restored", body = VehicleEnvelope),
        (status = 400, description = "Vehicle missing or not deleted", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vehicles"
)]
pub async fn restore_vehicle_handler(
    State(service): State<VehicleService>,
    _admin: AuthAdmin,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<Vehicle>>, ApiError> {
    let vehicle = service.restore(id).await?;
    Ok(Json(ServiceResponse::with_message(
        "Vehicle restored successfully",
        vehicle,
    )))
}
