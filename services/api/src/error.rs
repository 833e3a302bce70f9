//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure to open the Postgres pool for the blob store.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// The `kv_blobs` migration could not be applied.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Startup values that only fail once they are put to use, such as the CORS origin.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failures_keep_their_source_message() {
        let config: ApiError =
            ConfigError::InvalidValue("SCHEDULE_WINDOW_DAYS".to_string(), "must be at least 1".to_string())
                .into();
        assert!(matches!(config, ApiError::Config(_)));
        assert!(config.to_string().contains("SCHEDULE_WINDOW_DAYS"));

        let db: ApiError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(db, ApiError::Database(_)));

        let io: ApiError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(io.to_string().contains("port taken"));
    }
}
