//! # Error Types
//!
//! Structured error types for mdl_core. Every variant names the entity kind
//! and index involved so a caller can point at the offending record without
//! re-parsing the message.
//!
//! Geometry mismatches are the only non-fatal kind: the geometry passes
//! collect them as warnings (see [`crate::geometry::Outcome`]) instead of
//! returning them.
//!
//! ## Example
//!
//! ```rust
//! use mdl_core::errors::{ModelError, ModelResult};
//!
//! fn check_floor(floor: u32) -> ModelResult<()> {
//!     if floor == 0 {
//!         return Err(ModelError::invalid_input("floor", "0", "Floors are numbered from 1"));
//!     }
//!     Ok(())
//! }
//! assert!(check_floor(0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for mdl_core operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Structured error type for model graph operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ModelError {
    /// Two entities in one store share an index
    #[error("Duplicate index: {kind} #{index} already exists")]
    DuplicateIndex { kind: String, index: u32 },

    /// A reference points at an entity that does not exist
    #[error("Missing reference: {kind} #{index} field '{field}' points at {target} #{target_index}")]
    MissingReference {
        kind: String,
        index: u32,
        field: String,
        target: String,
        target_index: u32,
    },

    /// A replicated or mirrored point has no node at its target position
    #[error("Geometry mismatch: {kind} #{index} - {reason}")]
    GeometryMismatch {
        kind: String,
        index: u32,
        reason: String,
    },

    /// The same merge key appears twice inside one input collection
    #[error("Merge conflict: {kind} key '{key}' appears more than once")]
    MergeConflict { kind: String, key: String },

    /// Record text could not be parsed
    #[error("Invalid record in block {block} at line {line}: {reason}")]
    InvalidRecord {
        block: String,
        line: usize,
        reason: String,
    },

    /// An engine parameter is invalid
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Configuration could not be read or parsed
    #[error("Config error in '{path}': {reason}")]
    Config { path: String, reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ModelError {
    /// Create a DuplicateIndex error
    pub fn duplicate_index(kind: impl Into<String>, index: u32) -> Self {
        ModelError::DuplicateIndex {
            kind: kind.into(),
            index,
        }
    }

    /// Create a MissingReference error
    pub fn missing_reference(
        kind: impl Into<String>,
        index: u32,
        field: impl Into<String>,
        target: impl Into<String>,
        target_index: u32,
    ) -> Self {
        ModelError::MissingReference {
            kind: kind.into(),
            index,
            field: field.into(),
            target: target.into(),
            target_index,
        }
    }

    /// Create a GeometryMismatch warning
    pub fn geometry_mismatch(kind: impl Into<String>, index: u32, reason: impl Into<String>) -> Self {
        ModelError::GeometryMismatch {
            kind: kind.into(),
            index,
            reason: reason.into(),
        }
    }

    /// Create a MergeConflict error
    pub fn merge_conflict(kind: impl Into<String>, key: impl Into<String>) -> Self {
        ModelError::MergeConflict {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Create an InvalidRecord error
    pub fn invalid_record(block: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        ModelError::InvalidRecord {
            block: block.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        ModelError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ModelError::FileLocked { .. })
    }

    /// True for diagnostics that a geometry pass reports but does not abort on
    pub fn is_warning(&self) -> bool {
        matches!(self, ModelError::GeometryMismatch { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::DuplicateIndex { .. } => "DUPLICATE_INDEX",
            ModelError::MissingReference { .. } => "MISSING_REFERENCE",
            ModelError::GeometryMismatch { .. } => "GEOMETRY_MISMATCH",
            ModelError::MergeConflict { .. } => "MERGE_CONFLICT",
            ModelError::InvalidRecord { .. } => "INVALID_RECORD",
            ModelError::InvalidInput { .. } => "INVALID_INPUT",
            ModelError::FileError { .. } => "FILE_ERROR",
            ModelError::FileLocked { .. } => "FILE_LOCKED",
            ModelError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ModelError::Config { .. } => "CONFIG_ERROR",
            ModelError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = ModelError::missing_reference("Beam", 3, "elset", "Elset", 5);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"MissingReference\""));
        let roundtrip: ModelError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ModelError::duplicate_index("Node", 1).error_code(), "DUPLICATE_INDEX");
        assert_eq!(ModelError::merge_conflict("Design", "G1").error_code(), "MERGE_CONFLICT");
        assert_eq!(ModelError::invalid_record("NODEXY", 4, "bad").error_code(), "INVALID_RECORD");
    }

    #[test]
    fn test_only_geometry_mismatch_is_warning() {
        assert!(ModelError::geometry_mismatch("Beam", 1, "no node").is_warning());
        assert!(!ModelError::duplicate_index("Beam", 1).is_warning());
        assert!(ModelError::file_locked("a.MDL", "x", "now").is_recoverable());
    }

    #[test]
    fn test_message_names_the_record() {
        let msg = ModelError::missing_reference("Column", 2, "elset", "Elset", 9).to_string();
        assert!(msg.contains("Column #2"));
        assert!(msg.contains("Elset #9"));
    }
}
