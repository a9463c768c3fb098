use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle of one gateway transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "SUCCESS" => Ok(PaymentStatus::Success),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentTransaction {
    pub id: i32,
    pub order_id: i32,
    pub txn_ref: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub response_code: Option<String>,
    pub bank_code: Option<String>,
    pub gateway_transaction_no: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order fields needed to start a payment
#[derive(Debug, Clone, FromRow)]
pub struct PayableOrder {
    pub id: i32,
    pub customer_id: i32,
    pub total_amount: Decimal,
    pub status: String,
}

/// Redirect target for the customer's browser
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentUrlResponse {
    pub order_id: i32,
    pub txn_ref: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_url: String,
}

/// Outcome of a gateway return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentResult {
    pub success: bool,
    pub order_id: i32,
    pub txn_ref: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub response_code: String,
    pub transaction_no: Option<String>,
    pub bank_code: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_column_text() {
        for status in [PaymentStatus::Pending, PaymentStatus::Success, PaymentStatus::Failed] {
            assert_eq!(PaymentStatus::try_from(status.as_str().to_string()), Ok(status));
        }
        assert!(PaymentStatus::try_from("REFUNDED".to_string()).is_err());
    }
}
