use crate::store::StoreError;
use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// One or more field rules failed. Nothing was written.
    #[error("The given data was invalid ({0})")]
    Validation(FieldErrors),

    /// The id is absent from the partition the operation addresses.
    #[error("{label} {id} not found")]
    NotFound { label: &'static str, id: i32 },

    /// A blob write or delete failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed list parameters.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FieldErrors> for LifecycleError {
    fn from(errors: FieldErrors) -> Self {
        LifecycleError::Validation(errors)
    }
}
