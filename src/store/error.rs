//! Error types for the conversation store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing conversations
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite driver failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// PostgreSQL driver failure
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Connection pool could not hand out a connection
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Connection pool could not be built
    #[error("Pool build error: {0}")]
    PoolBuild(#[from] deadpool_postgres::BuildError),

    /// A stored row could not be decoded
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_row_display() {
        let err = StoreError::CorruptRow("unknown role: robot".to_string());
        assert!(err.to_string().contains("Corrupt row"));
        assert!(err.to_string().contains("robot"));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
