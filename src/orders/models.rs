use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Cancelled,
    Approve,
    Paid,
    Delivering,
    Done,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Cancelled,
        OrderStatus::Approve,
        OrderStatus::Paid,
        OrderStatus::Delivering,
        OrderStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Approve => "APPROVE",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Done => "DONE",
        }
    }

    /// Case-insensitive parse
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("Unknown order status: {}", value))
    }
}

/// Order row joined with its customer and dealer
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i32,
    pub customer_id: i32,
    pub dealer_id: i32,
    pub order_date: NaiveDateTime,
    pub total_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub customer_address: String,
    pub dealer_name: String,
    pub dealer_address: String,
}

/// Ordered vehicle with its catalogue details
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OrderVehicleResponse {
    pub order_id: i32,
    pub vehicle_id: i32,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub model: String,
    pub color: String,
    pub version: Option<String>,
    pub image: Option<String>,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderCustomer {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDealer {
    pub id: i32,
    pub dealer_name: String,
    pub address: String,
}

/// Response DTO for an order with all details
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub customer_id: i32,
    pub dealer_id: i32,
    pub order_date: NaiveDateTime,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub customer: OrderCustomer,
    pub dealer: OrderDealer,
    pub vehicles: Vec<OrderVehicleResponse>,
}

impl OrderResponse {
    pub fn from_row(row: OrderRow, vehicles: Vec<OrderVehicleResponse>) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            dealer_id: row.dealer_id,
            order_date: row.order_date,
            total_amount: row.total_amount,
            status: row.status,
            customer: OrderCustomer {
                id: row.customer_id,
                name: row.customer_name,
                phone: row.customer_phone,
                email: row.customer_email,
                address: row.customer_address,
            },
            dealer: OrderDealer {
                id: row.dealer_id,
                dealer_name: row.dealer_name,
                address: row.dealer_address,
            },
            vehicles,
        }
    }
}

/// One vehicle line of a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub vehicle_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Request DTO for creating a new order
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Selling dealer; defaults to the dealer holding the most stock of the first vehicle
    pub dealer_id: Option<i32>,
    #[validate(length(min = 1, message = "Order must contain at least one vehicle"))]
    #[validate]
    pub items: Vec<OrderItemRequest>,
}

/// Request DTO for `PATCH /api/orders/{id}/status`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Which orders a caller may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Customer(i32),
    /// Assigned to the dealer or containing a vehicle the dealer stocks
    Dealer(i32),
}
