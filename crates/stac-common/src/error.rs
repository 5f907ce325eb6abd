//! Error taxonomy for the raster-catalog engine.
//!
//! Every error kind maps to a stable status code so callers can branch
//! programmatically (retry vs. fix-and-resubmit vs. abandon). Internal
//! failures are always wrapped before they reach a caller.

use thiserror::Error;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Primary error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    // === Search errors ===
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Result set too large: {count} records exceeds maximum of {max}")]
    ResultTooLarge { count: usize, max: usize },

    // === Publish validation errors ===
    #[error("Asset already exists (publish without force): {0}")]
    Conflict(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    // === Lookup errors ===
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset not ready: {0}")]
    AssetNotReady(String),

    #[error("Unknown job token: {0}")]
    UnknownToken(String),

    #[error("Unsupported fetch type: {0}")]
    UnsupportedFetchType(String),

    // === Raster access errors ===
    #[error("Coordinate outside raster extent: {0}")]
    OutOfBounds(String),

    #[error("Unreadable raster: {0}")]
    UnreadableRaster(String),

    // === Infrastructure errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CatalogError {
    /// Get the stable status code for this error.
    ///
    /// Codes follow HTTP conventions so a transport layer can pass them
    /// through unchanged.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::InvalidQuery(_)
            | CatalogError::UnsupportedMediaType(_)
            | CatalogError::UnsupportedScheme(_)
            | CatalogError::InvalidDatetime(_)
            | CatalogError::UnsupportedFetchType(_)
            | CatalogError::OutOfBounds(_) => 400,

            CatalogError::NotFound(_) | CatalogError::UnknownToken(_) => 404,

            CatalogError::Conflict(_) => 409,

            CatalogError::AssetNotReady(_) => 409,

            CatalogError::ResultTooLarge { .. } => 413,

            CatalogError::UnreadableRaster(_) => 422,

            CatalogError::StorageError(_) | CatalogError::InternalError(_) => 500,
        }
    }

    /// Whether the caller can expect a retry of the same request to succeed
    /// without changing it (transient infrastructure failures only).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::StorageError(_) | CatalogError::InternalError(_)
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::InternalError(format!("JSON error: {}", err))
    }
}
