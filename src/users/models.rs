use serde::Deserialize;
use validator::Validate;

use crate::auth::Role;
use crate::validation::{validate_not_blank, validate_phone};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

/// Partial account update; omitted or blank fields are left unchanged
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub customer_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub customer_phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub customer_email: Option<String>,
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub customer_address: Option<String>,

    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub dealer_name: Option<String>,
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub dealer_address: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub dealer_quantity: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateUserRequest::default().validate().is_ok());
    }

    #[test]
    fn test_negative_dealer_quantity_rejected() {
        let req = UpdateUserRequest {
            dealer_quantity: Some(-1),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bad_phone_rejected() {
        let req = UpdateUserRequest {
            customer_phone: Some("call me".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
