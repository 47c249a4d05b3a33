use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Product with PID '{0}' already exists")]
    DuplicatePid(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Catalog seed error: {0}")]
    Seed(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<std::io::Error> for ProductError {
    fn from(err: std::io::Error) -> Self {
        ProductError::Seed(err.to_string())
    }
}

impl From<serde_json::Error> for ProductError {
    fn from(err: serde_json::Error) -> Self {
        ProductError::Seed(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ProductError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProductError::Validation(err.to_string())
    }
}
