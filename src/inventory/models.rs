use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// One dealer's stock of one vehicle, with vehicle and dealer details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryItem {
    pub vehicle_id: i32,
    pub dealer_id: i32,
    pub quantity: i32,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_version: Option<String>,
    #[schema(value_type = String)]
    pub vehicle_price: Decimal,
    pub vehicle_manufacture_date: NaiveDate,
    pub vehicle_image: Option<String>,
    pub category_id: i32,
    pub category_name: String,
    pub dealer_name: String,
    pub dealer_address: String,
}

/// `GET /api/inventory` filters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryFilter {
    /// Required for admins, ignored for dealers
    pub dealer_id: Option<i32>,
    pub category_id: Option<i32>,
    /// Matches model, color or version
    pub search: Option<String>,
    /// Include rows with zero quantity (default true)
    pub show_out_of_stock: Option<bool>,
}

/// Which dealer's stock an admin addresses
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DealerScope {
    pub dealer_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddInventoryRequest {
    pub vehicle_id: i32,
    /// Required for admins, ignored for dealers
    pub dealer_id: Option<i32>,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateInventoryRequest {
    /// Required for admins, ignored for dealers
    pub dealer_id: Option<i32>,
    #[validate(range(min = 0, message = "Quantity must be a non-negative number"))]
    pub quantity: i32,
}
