pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod status;

pub use error::AppointmentError;
pub use handlers::*;
pub use models::*;
pub use repository::AppointmentRepository;
pub use service::{spawn_expiry_sweep, AppointmentService};
pub use status::AppointmentStatus;
