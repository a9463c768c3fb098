// HTTP handlers for dealer inventory

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::AuthStaff;
use crate::error::ApiError;
use crate::inventory::{
    AddInventoryRequest, DealerScope, InventoryFilter, InventoryItem, InventoryService,
    UpdateInventoryRequest,
};
use crate::response::{Created, ServiceResponse};

/// Handler for GET /api/inventory
pub async fn list_inventory_handler(
    State(service): State<InventoryService>,
    staff: AuthStaff,
    Query(filter): Query<InventoryFilter>,
) -> Result<Json<ServiceResponse<Vec<InventoryItem>>>, ApiError> {
    let items = service.list(staff.actor, filter).await?;
    Ok(Json(ServiceResponse::with_message(
        "Inventory retrieved successfully",
        items,
    )))
}

/// Handler for GET /api/inventory/{vehicle_id}
pub async fn get_inventory_item_handler(
    State(service): State<InventoryService>,
    staff: AuthStaff,
    Path(vehicle_id): Path<i32>,
    Query(scope): Query<DealerScope>,
) -> Result<Json<ServiceResponse<InventoryItem>>, ApiError> {
    let item = service
        .get_item(staff.actor, vehicle_id, scope.dealer_id)
        .await?;
    Ok(Json(ServiceResponse::with_message(
        "Inventory item retrieved successfully",
        item,
    )))
}

/// Handler for POST /api/inventory
pub async fn add_inventory_handler(
    State(service): State<InventoryService>,
    staff: AuthStaff,
    Json(request): Json<AddInventoryRequest>,
) -> Result<Created<InventoryItem>, ApiError> {
    let item = service.add(staff.actor, request).await?;
    Ok(Created(ServiceResponse::with_message(
        "Vehicle added to inventory successfully",
        item,
    )))
}

/// Handler for PUT /api/inventory/{vehicle_id}
pub async fn update_inventory_handler(
    State(service): State<InventoryService>,
    staff: AuthStaff,
    Path(vehicle_id): Path<i32>,
    Json(request): Json<UpdateInventoryRequest>,
) -> Result<Json<ServiceResponse<InventoryItem>>, ApiError> {
    let item = service.update(staff.actor, vehicle_id, request).await?;
    Ok(Json(ServiceResponse::with_message(
        "Inventory updated successfully",
        item,
    )))
}

/// Handler for DELETE /api/inventory/{vehicle_id}
pub async fn remove_inventory_handler(
    State(service): State<InventoryService>,
    staff: AuthStaff,
    Path(vehicle_id): Path<i32>,
    Query(scope): Query<DealerScope>,
) -> Result<Json<ServiceResponse<()>>, ApiError> {
    service
        .remove(staff.actor, vehicle_id, scope.dealer_id)
        .await?;
    Ok(Json(ServiceResponse::message(
        "Vehicle removed from inventory successfully",
    )))
}
