// Uniform success envelope returned by every handler

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::categories::Category;
use crate::pagination::PagedResult;
use crate::vehicles::Vehicle;

/// Result wrapper carrying a success flag, a message and an optional payload.
/// Failures use [`crate::error::ErrorResponse`] which shares the `success`
/// and `message` fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    CategoryEnvelope = ServiceResponse<Category>,
    CategoryListEnvelope = ServiceResponse<Vec<Category>>,
    VehicleEnvelope = ServiceResponse<Vehicle>,
    VehicleListEnvelope = ServiceResponse<Vec<Vehicle>>,
    VehiclePageEnvelope = ServiceResponse<PagedResult<Vehicle>>
)]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: "OK".to_string(),
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ServiceResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Handler return type: `Created(ServiceResponse)` maps to 201.
pub struct Created<T>(pub ServiceResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}
