// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::{AuthCustomer, AuthenticatedUser};
use crate::error::ApiError;
use crate::orders::{CreateOrderRequest, OrderResponse, OrderService, UpdateStatusRequest};
use crate::response::{Created, ServiceResponse};

/// Handler for POST /api/orders
/// Places an order for the authenticated customer
pub async fn create_order_handler(
    State(service): State<OrderService>,
    customer: AuthCustomer,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Created<OrderResponse>, ApiError> {
    let order = service.create_order(customer.customer_id, request).await?;
    Ok(Created(ServiceResponse::with_message(
        "Order created successfully.",
        order,
    )))
}

/// Handler for GET /api/orders
/// Admins see every order, dealers their assigned or stocked orders,
/// customers their own
pub async fn list_orders_handler(
    State(service): State<OrderService>,
    user: AuthenticatedUser,
) -> Result<Json<ServiceResponse<Vec<OrderResponse>>>, ApiError> {
    let orders = service.list(user.actor()?).await?;
    let message = if orders.is_empty() {
        "No orders found.".to_string()
    } else {
        format!("Retrieved {} orders successfully.", orders.len())
    };
    Ok(Json(ServiceResponse::with_message(message, orders)))
}

/// Handler for GET /api/orders/{id}
pub async fn get_order_handler(
    State(service): State<OrderService>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ServiceResponse<OrderResponse>>, ApiError> {
    let order = service.get(user.actor()?, id).await?;
    Ok(Json(ServiceResponse::ok(order)))
}

/// Handler for PATCH /api/orders/{id}/status
pub async fn update_order_status_handler(
    State(service): State<OrderService>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ServiceResponse<OrderResponse>>, ApiError> {
    let order = service
        .update_status(user.actor()?, id, &request.status)
        .await?;
    let message = if order.status == crate::orders::OrderStatus::Paid {
        format!("Order status updated to {} and inventory reduced successfully.", order.status)
    } else {
        format!("Order status updated to {} successfully.", order.status)
    };
    Ok(Json(ServiceResponse::with_message(message, order)))
}
