//! # Error Types
//!
//! Structured error types for elec_core. Errors carry enough context
//! (field, engine, record id) for a caller to identify the failing item
//! and to render a client-facing message without string parsing.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_m: f64) -> CalcResult<()> {
//!     if length_m < 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "longitud",
//!             length_m.to_string(),
//!             "Length cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for elec_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is outside its physical domain
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing or empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// An engine could not compute a record. Wraps the underlying cause
    /// together with the engine name and the offending record id.
    #[error("Error in {engine} calculation for record '{record_id}': {cause}")]
    CalculationFailed {
        engine: String,
        record_id: String,
        #[source]
        cause: Box<CalcError>,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Wrap an error with the engine and record that produced it.
    ///
    /// Already-wrapped errors are returned unchanged so that nested
    /// helpers (a suggestion scan calling `calculate`) do not stack
    /// context twice.
    pub fn calculation_failed(engine: impl Into<String>, record_id: impl Into<String>, cause: CalcError) -> Self {
        match cause {
            wrapped @ CalcError::CalculationFailed { .. } => wrapped,
            cause => CalcError::CalculationFailed {
                engine: engine.into(),
                record_id: record_id.into(),
                cause: Box::new(cause),
            },
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Record id of the failing item, if this error was raised by an engine
    pub fn record_id(&self) -> Option<&str> {
        match self {
            CalcError::CalculationFailed { record_id, .. } => Some(record_id),
            _ => None,
        }
    }

    /// Engine name, if this error was raised by an engine
    pub fn engine(&self) -> Option<&str> {
        match self {
            CalcError::CalculationFailed { engine, .. } => Some(engine),
            _ => None,
        }
    }

    /// The innermost cause (self when not wrapped)
    pub fn root_cause(&self) -> &CalcError {
        match self {
            CalcError::CalculationFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("cosPhi", "1.2", "Power factor must be between 0.1 and 1.0");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("id").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::serialization("bad").error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_calculation_failed_carries_context() {
        let cause = CalcError::invalid_input("tensionNominal", "0", "Voltage must be positive");
        let error = CalcError::calculation_failed("Voltage-Drop", "VD-7", cause.clone());

        assert_eq!(error.engine(), Some("Voltage-Drop"));
        assert_eq!(error.record_id(), Some("VD-7"));
        assert_eq!(error.root_cause(), &cause);

        let message = error.to_string();
        assert!(message.contains("Voltage-Drop"));
        assert!(message.contains("VD-7"));
        assert!(message.contains("Voltage must be positive"));
    }

    #[test]
    fn test_calculation_failed_does_not_double_wrap() {
        let inner = CalcError::calculation_failed("Thermal", "T-1", CalcError::missing_field("id"));
        let outer = CalcError::calculation_failed("Thermal", "other", inner.clone());
        assert_eq!(inner, outer);
    }

    #[test]
    fn test_wrapped_error_serialization() {
        let error = CalcError::calculation_failed("DPMS", "A-1", CalcError::missing_field("dimensiones"));
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("CalculationFailed"));
        assert!(json.contains("dimensiones"));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }
}
