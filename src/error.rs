/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The underlying event log or catalog is unavailable. Always surfaced
    /// to the caller; a failed read never turns into an empty result.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored state that should be well-formed failed to decode
    /// (labels or timestamps written by an older or foreign writer).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for the validation errors a boundary layer reports back to the
    /// client, as opposed to storage failures it must handle itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::InvalidInput(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
