use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::appointments::AppointmentStatus;

/// Appointment joined with customer and vehicle details
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: i32,
    pub customer_id: i32,
    pub customer_name: String,
    pub vehicle_id: i32,
    pub vehicle_model: String,
    pub vehicle_version: Option<String>,
    pub vehicle_color: String,
    /// Showroom local time
    pub appointment_date: NaiveDateTime,
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub vehicle_id: i32,
    pub appointment_date: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RescheduleRequest {
    pub appointment_date: NaiveDateTime,
}

/// List filters; `customer_name` only applies to staff listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AppointmentFilter {
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotList {
    pub date: NaiveDate,
    pub slots: Vec<NaiveDateTime>,
}
