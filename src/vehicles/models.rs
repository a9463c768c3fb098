use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{validate_not_blank, validate_positive_decimal};

/// Catalogue entry with its category name joined in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vehicle {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 2)]
    pub category_id: i32,
    #[schema(example = "SUV")]
    pub category_name: String,
    #[schema(example = "Pearl White")]
    pub color: String,
    #[schema(value_type = String, example = "45990.00")]
    pub price: Decimal,
    pub manufacture_date: NaiveDate,
    #[schema(example = "VF 8")]
    pub model: String,
    #[schema(example = "Plus")]
    pub version: Option<String>,
    pub image: Option<String>,
    pub is_deleted: bool,
}

/// Create and update payload; update replaces every field
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VehicleRequest {
    pub category_id: i32,

    #[validate(
        length(min = 1, max = 50, message = "Color must be at most 50 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "Pearl White")]
    pub color: String,

    #[validate(custom(function = "validate_positive_decimal", message = "Price must be greater than 0"))]
    #[schema(value_type = String, example = "45990.00")]
    pub price: Decimal,

    pub manufacture_date: NaiveDate,

    #[validate(
        length(min = 1, max = 100, message = "Model must be at most 100 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "VF 8")]
    pub model: String,

    #[validate(length(max = 50, message = "Version must be at most 50 characters"))]
    pub version: Option<String>,

    #[validate(length(max = 500, message = "Image URL must be at most 500 characters"))]
    pub image: Option<String>,
}
