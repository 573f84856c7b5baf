use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// The browser process or its page context could not be created.
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors that must stop the current cycle instead of being skipped per item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::BrowserLaunch(_))
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
