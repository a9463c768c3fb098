use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::appointments::AppointmentStatus;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound(i32),

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Vehicle not found or deleted")]
    VehicleUnavailable,

    #[error("Appointment date must be in the future")]
    DateNotInFuture,

    #[error("Appointment already exists for this customer, vehicle and time slot")]
    DuplicateSlot,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Only pending appointments can be rescheduled")]
    NotReschedulable,

    #[error("Appointment can only be started from 30 minutes before until 2 hours after its scheduled time")]
    OutsideStartWindow,

    #[error("Invalid appointment status: {0}")]
    InvalidStatus(String),

    #[error("start_date cannot be after end_date")]
    InvalidDateRange,

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AppointmentError> for ApiError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(id) => ApiError::not_found("Appointment", id),
            AppointmentError::DuplicateSlot => ApiError::conflict(err.to_string()),
            AppointmentError::Forbidden(msg) => ApiError::Forbidden(msg),
            AppointmentError::DatabaseError(db) => ApiError::DatabaseError(db),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppointmentError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
