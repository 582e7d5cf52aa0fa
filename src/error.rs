//! ==============================================================================
//! error.rs - error taxonomy for the sensor service
//! ==============================================================================
//!
//! purpose:
//!     one closed set of failures that the service operations can return.
//!     the http layer (server.rs) maps each variant onto a status code.
//!
//! taxonomy:
//!     - Format:   the ingestion payload is malformed (field count or a
//!                 non-numeric field, with the offending field index)
//!     - NotFound: a status query ran before any reading was stored
//!     - Store:    the persistence layer failed; surfaced as-is, never retried
//!
//! empty or degenerate input to the analysis engine is NOT an error here.
//! statistics and correlation return zero-valued results instead.
//!
//! ==============================================================================

use thiserror::Error;

/// why a raw payload could not be turned into a sample
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("expected {expected} comma-separated fields, got {found}")]
    FieldCount { expected: usize, found: usize },

    /// `index` is 1-based, matching how the device firmware documents its fields
    #[error("field {index} is not numeric: {value:?}")]
    NotNumeric { index: usize, value: String },
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("malformed payload: {0}")]
    Format(#[from] FormatError),

    #[error("no readings available yet")]
    NotFound,

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
