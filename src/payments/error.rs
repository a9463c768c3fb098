use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::orders::OrderError;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Order not found.")]
    OrderNotFound(i32),

    #[error("You can only pay for your own orders.")]
    NotOwner,

    #[error("Only approved orders can be paid. Current status: {0}")]
    NotPayable(String),

    #[error("Order amount cannot be sent to the payment gateway.")]
    InvalidAmount,

    #[error("Payment gateway is not configured.")]
    NotConfigured,

    #[error("Invalid payment signature.")]
    InvalidSignature,

    #[error("Missing payment parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Payment transaction not found.")]
    TransactionNotFound,

    #[error("Paid amount does not match the order total.")]
    AmountMismatch,
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::DatabaseError(db) => ApiError::DatabaseError(db),
            PaymentError::Order(order) => order.into(),
            PaymentError::OrderNotFound(id) => ApiError::not_found("Order", id),
            PaymentError::TransactionNotFound => ApiError::not_found("Payment transaction", "txn_ref"),
            PaymentError::NotOwner => ApiError::Forbidden(err.to_string()),
            PaymentError::NotConfigured => ApiError::InternalError(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::from(PaymentError::NotOwner).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(PaymentError::InvalidSignature).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PaymentError::OrderNotFound(3)).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_order_errors_keep_their_mapping() {
        let err = PaymentError::Order(OrderError::ConcurrentUpdate);
        assert_eq!(ApiError::from(err).status_code(), StatusCode::CONFLICT);
    }
}
