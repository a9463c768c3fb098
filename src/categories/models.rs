use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Vehicle category (Sedan, SUV, Pickup, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "SUV")]
    pub name: String,
}

/// Create and update payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(
        length(min = 1, max = 100, message = "Category name must be between 1 and 100 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "SUV")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let req = CategoryRequest { name: "   ".into() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_long_name_rejected() {
        let req = CategoryRequest { name: "x".repeat(101) };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_name() {
        let req = CategoryRequest { name: "Crossover".into() };
        assert!(req.validate().is_ok());
    }
}
