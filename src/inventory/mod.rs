pub mod allocation;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::*;
pub use models::*;
pub use repository::InventoryRepository;
pub use service::InventoryService;
