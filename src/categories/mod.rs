pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::*;
pub use models::*;
pub use repository::CategoryRepository;
pub use service::CategoryService;
