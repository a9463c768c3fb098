// HTTP handlers for appointment booking and the showroom workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::appointments::{
    Appointment, AppointmentFilter, AppointmentService, CreateAppointmentRequest,
    RescheduleRequest, SlotList, SlotQuery,
};
use crate::auth::{AuthCustomer, AuthStaff, AuthenticatedUser};
use crate::error::ApiError;
use crate::pagination::PagedResult;
use crate::response::{Created, ServiceResponse};

type AppointmentResult = Result<Json<ServiceResponse<Appointment>>, ApiError>;

/// Handler for GET /api/appointments/slots?date=YYYY-MM-DD
pub async fn available_slots_handler(
    State(service): State<AppointmentService>,
    Query(query): Query<SlotQuery>,
) -> Json<ServiceResponse<SlotList>> {
    Json(ServiceResponse::ok(service.available_slots(query.date)))
}

/// Handler for POST /api/appointments
pub async fn create_appointment_handler(
    State(service): State<AppointmentService>,
    customer: AuthCustomer,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Created<Appointment>, ApiError> {
    let appointment = service.create(customer.customer_id, request).await?;
    Ok(Created(ServiceResponse::with_message(
        "Appointment created successfully",
        appointment,
    )))
}

/// Handler for GET /api/appointments
pub async fn list_appointments_handler(
    State(service): State<AppointmentService>,
    user: AuthenticatedUser,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<ServiceResponse<PagedResult<Appointment>>>, ApiError> {
    let page = service.list(user.actor()?, filter).await?;
    Ok(Json(ServiceResponse::with_message(
        "Appointments retrieved successfully",
        page,
    )))
}

/// Handler for GET /api/appointments/{id}
pub async fn get_appointment_handler(
    State(service): State<AppointmentService>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppointmentResult {
    let appointment = service.get(user.actor()?, id).await?;
    Ok(Json(ServiceResponse::ok(appointment)))
}

/// Handler for PUT /api/appointments/{id}
pub async fn reschedule_appointment_handler(
    State(service): State<AppointmentService>,
    customer: AuthCustomer,
    Path(id): Path<i32>,
    Json(request): Json<RescheduleRequest>,
) -> AppointmentResult {
    let appointment = service.reschedule(customer.customer_id, id, request).await?;
    Ok(Json(ServiceResponse::with_message(
        "Appointment updated successfully",
        appointment,
    )))
}

/// Handler for POST /api/appointments/{id}/cancel
pub async fn cancel_appointment_handler(
    State(service): State<AppointmentService>,
    customer: AuthCustomer,
    Path(id): Path<i32>,
) -> AppointmentResult {
    let appointment = service.cancel(customer.customer_id, id).await?;
    Ok(Json(ServiceResponse::with_message(
        "Appointment cancelled successfully",
        appointment,
    )))
}

/// Handler for POST /api/appointments/{id}/approve
pub async fn approve_appointment_handler(
    State(service): State<AppointmentService>,
    _staff: AuthStaff,
    Path(id): Path<i32>,
) -> AppointmentResult {
    let appointment = service.approve(id).await?;
    Ok(Json(ServiceResponse::with_message(
        "Appointment approved successfully",
        appointment,
    )))
}

/// Handler for POST /api/appointments/{id}/start
pub async fn start_appointment_handler(
    State(service): State<AppointmentService>,
    _staff: AuthStaff,
    Path(id): Path<i32>,
) -> AppointmentResult {
    let appointment = service.start(id).await?;
    Ok(Json(ServiceResponse::with_message(
        "Appointment started successfully",
        appointment,
    )))
}

/// Handler for POST /api/appointments/{id}/complete
pub async fn complete_appointment_handler(
    State(service): State<AppointmentService>,
    _staff: AuthStaff,
    Path(id): Path<i32>,
) -> AppointmentResult {
    let appointment = service.complete(id).await?;
    Ok(Json(ServiceResponse::with_message(
        "Appointment completed successfully",
        appointment,
    )))
}
