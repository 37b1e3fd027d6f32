use thiserror::Error;

/// usagedash error types
#[derive(Error, Debug)]
pub enum DashError {
    /// A stored document did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// A stored timestamp matched none of the accepted formats
    #[error("malformed timestamp {value:?} in {field}")]
    Timestamp { field: String, value: String },

    /// Requested plan is not one of Trial, Inactive, Premium
    #[error("invalid plan {0:?}: expected Trial, Inactive or Premium")]
    InvalidPlan(String),

    /// Patch target does not exist
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// Backend failure (connectivity, permission, storage)
    #[error("store error: {0}")]
    Store(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for usagedash
pub type Result<T> = std::result::Result<T, DashError>;
