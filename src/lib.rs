pub mod browser;
pub mod config;
pub mod extract;
pub mod gateway;
pub mod models;
pub mod monitor;
pub mod pricing;
pub mod scheduler;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
