// Account data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::validation::{validate_not_blank, validate_phone};

/// Account role, stored as `users.role_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Customer = 1,
    Dealer = 2,
    Admin = 3,
}

impl Role {
    pub fn id(&self) -> i32 {
        *self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Role::Customer),
            2 => Some(Role::Dealer),
            3 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Dealer => "Dealer",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    #[sqlx(rename = "role_id")]
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Customer profile attached to a Customer account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerProfile {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Dealer profile attached to a Dealer account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DealerProfile {
    pub id: i32,
    pub user_id: i32,
    pub dealer_name: String,
    pub address: String,
    pub quantity: i32,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub role_id: i32,
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealer: Option<DealerProfile>,
}

impl UserResponse {
    pub fn new(
        user: User,
        customer: Option<CustomerProfile>,
        dealer: Option<DealerProfile>,
    ) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role_id: user.role.id(),
            role: user.role,
            is_deleted: user.is_deleted,
            created_at: user.created_at,
            customer,
            dealer,
        }
    }
}

/// Refresh token database model
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: i32,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Registration request DTO
///
/// Customer fields are required when `role` is CUSTOMER, dealer fields when
/// it is DEALER. Admin accounts cannot self-register.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,

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

/// Profile rows to insert alongside the user
#[derive(Debug, Clone, PartialEq)]
pub enum NewProfile {
    Customer {
        name: String,
        phone: String,
        email: String,
        address: String,
    },
    Dealer {
        dealer_name: String,
        address: String,
        quantity: i32,
    },
    None,
}

impl RegisterRequest {
    /// Pick the profile matching the requested role, or name the missing field
    pub fn profile(&self) -> Result<NewProfile, String> {
        fn required(value: &Option<String>, field: &str) -> Result<String, String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format!("{} is required", field))
        }

        match self.role {
            Role::Customer => Ok(NewProfile::Customer {
                name: required(&self.customer_name, "Customer name")?,
                phone: required(&self.customer_phone, "Phone number")?,
                email: required(&self.customer_email, "Email")?,
                address: required(&self.customer_address, "Address")?,
            }),
            Role::Dealer => Ok(NewProfile::Dealer {
                dealer_name: required(&self.dealer_name, "Dealer name")?,
                address: required(&self.dealer_address, "Dealer address")?,
                quantity: self.dealer_quantity.unwrap_or(0),
            }),
            Role::Admin => Err("Admin accounts cannot be registered".to_string()),
        }
    }
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh / logout request DTO
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response DTO
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_request() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            password: "secret1".into(),
            role: Role::Customer,
            customer_name: Some("Alice".into()),
            customer_phone: Some("0901234567".into()),
            customer_email: Some("alice@example.com".into()),
            customer_address: Some("1 Main St".into()),
            dealer_name: None,
            dealer_address: None,
            dealer_quantity: None,
        }
    }

    #[test]
    fn test_role_ids_round_trip() {
        for role in [Role::Customer, Role::Dealer, Role::Admin] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Role::Dealer).unwrap(), "DEALER");
    }

    #[test]
    fn test_valid_customer_request() {
        let req = customer_request();
        assert!(req.validate().is_ok());
        assert!(matches!(req.profile(), Ok(NewProfile::Customer { .. })));
    }

    #[test]
    fn test_short_username_rejected() {
        let mut req = customer_request();
        req.username = "ab".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_short_password_rejected() {
        let mut req = customer_request();
        req.password = "12345".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_customer_requires_phone() {
        let mut req = customer_request();
        req.customer_phone = None;
        assert_eq!(req.profile().unwrap_err(), "Phone number is required");
    }

    #[test]
    fn test_dealer_quantity_defaults_to_zero() {
        let req = RegisterRequest {
            role: Role::Dealer,
            dealer_name: Some("EV Hub".into()),
            dealer_address: Some("22 Side Rd".into()),
            ..customer_request()
        };
        assert_eq!(
            req.profile().unwrap(),
            NewProfile::Dealer {
                dealer_name: "EV Hub".into(),
                address: "22 Side Rd".into(),
                quantity: 0,
            }
        );
    }

    #[test]
    fn test_admin_cannot_register() {
        let req = RegisterRequest {
            role: Role::Admin,
            ..customer_request()
        };
        assert!(req.profile().is_err());
    }
}
