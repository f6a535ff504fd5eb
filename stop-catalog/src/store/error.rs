//! Persistent store error types.

/// Errors from the persistent store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connectivity, I/O or query failure
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A write was rejected by a uniqueness or foreign key constraint
    #[error("constraint violation: {message}")]
    Constraint { message: String },

    /// A persisted row could not be mapped back to a domain type
    #[error("invalid persisted data: {message}")]
    InvalidData { message: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error()
            && (db.is_unique_violation() || db.is_foreign_key_violation())
        {
            return StoreError::Constraint {
                message: db.message().to_string(),
            };
        }
        StoreError::Database(err)
    }
}
