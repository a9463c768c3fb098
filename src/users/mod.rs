// User administration: listing, profile updates and soft deletion

pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::*;
pub use models::*;
pub use service::UserService;
