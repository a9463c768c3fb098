use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::orders::OrderStatus;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Request validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Order not found.")]
    NotFound(i32),

    #[error("Customer not found.")]
    CustomerNotFound,

    #[error("Dealer not found.")]
    DealerNotFound,

    #[error("Vehicle not found.")]
    VehicleNotFound(i32),

    #[error("Vehicle is not available.")]
    VehicleUnavailable(i32),

    #[error("Vehicle is out of stock")]
    OutOfStock(i32),

    #[error("Invalid order status.")]
    InvalidStatus(String),

    #[error("Cannot change order status from {from} to {to}.")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Only orders that are being delivered can be marked as done.")]
    NotDelivering,

    #[error("Insufficient inventory for vehicle {vehicle_id}: required {required}, available {available}")]
    InsufficientInventory {
        vehicle_id: i32,
        required: i32,
        available: i64,
    },

    #[error("Order status was changed by another request. Please reload and try again.")]
    ConcurrentUpdate,

    #[error("{0}")]
    Forbidden(String),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::DatabaseError(db) => ApiError::DatabaseError(db),
            OrderError::ValidationError(errors) => ApiError::ValidationError(errors),
            OrderError::NotFound(id) => ApiError::not_found("Order", id),
            OrderError::InsufficientInventory { .. } | OrderError::ConcurrentUpdate => {
                ApiError::conflict(err.to_string())
            }
            OrderError::Forbidden(msg) => ApiError::Forbidden(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
