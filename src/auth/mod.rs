// Authentication module
// Accounts with Customer/Dealer/Admin roles, JWT access tokens and stored refresh tokens

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use handlers::{login_handler, logout_handler, me_handler, refresh_handler, register_handler};
pub use middleware::{Actor, AuthAdmin, AuthCustomer, AuthDealer, AuthStaff, AuthenticatedUser, MaybeUser};
pub use models::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, Role, User, UserResponse};
pub use repository::{AccountChanges, TokenRepository, UserRepository};
pub use service::AuthService;
pub use token::TokenService;
