// HTTP handlers for VNPay payments

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::collections::HashMap;

use crate::auth::AuthCustomer;
use crate::error::ApiError;
use crate::payments::{PaymentResult, PaymentService, PaymentUrlResponse};
use crate::response::{Created, ServiceResponse};

/// Handler for POST /api/payments/vnpay/{order_id}
/// Returns the gateway URL the customer should be redirected to
pub async fn create_payment_handler(
    State(service): State<PaymentService>,
    customer: AuthCustomer,
    Path(order_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Created<PaymentUrlResponse>, ApiError> {
    let client_ip = client_ip(&headers);
    let payment = service
        .create_payment_url(customer.customer_id, order_id, &client_ip)
        .await?;
    Ok(Created(ServiceResponse::with_message(
        "Payment URL created successfully.",
        payment,
    )))
}

/// Handler for GET /api/payments/vnpay/return
pub async fn payment_return_handler(
    State(service): State<PaymentService>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ServiceResponse<PaymentResult>>, ApiError> {
    let result = service.handle_return(&params).await?;
    Ok(Json(ServiceResponse {
        success: result.success,
        message: result.message.clone(),
        data: Some(result),
    }))
}

/// First address of `X-Forwarded-For`, then `X-Real-IP`
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("127.0.0.1")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "127.0.0.1");
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), "10.0.0.2");
    }
}
