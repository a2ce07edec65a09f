//! Error types for adapter operations.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure reported by a native format library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Library-specific status code, when one exists.
    pub status: Option<i64>,
    /// Message as reported by the library.
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: i64) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for NativeError {}

/// Errors that can occur while detecting, opening or reading a foreign file.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Detection declined the file. The host should try the next adapter.
    #[error("File is not in this format")]
    NotThisFormat,

    /// The bytes identify the format but violate its structural invariants.
    #[error("Malformed header: {reason}")]
    MalformedHeader {
        /// What was wrong with the header
        reason: String,
    },

    /// A native element type has no canonical mapping.
    #[error("Unsupported {format} element type: {tag}")]
    UnsupportedType {
        /// Format family that produced the tag
        format: &'static str,
        /// Printable form of the native tag
        tag: String,
    },

    /// Caller-supplied arguments are out of range.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// Which argument was rejected and why
        reason: String,
    },

    /// The underlying native library reported a failure.
    #[error("{library} error: {source}")]
    NativeLibrary {
        /// Name of the native library
        library: &'static str,
        /// Error reported by the library
        source: NativeError,
    },

    /// Mutation of a read-only file.
    #[error("Operation not permitted on a read-only file: {operation}")]
    NotPermitted {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// The foreign data model has no equivalent of this feature.
    #[error("Operation not applicable to this data model: {operation}")]
    NotApplicable {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// The handle is closed or was never opened.
    #[error("Invalid or closed file handle")]
    BadHandle,

    /// I/O error while reading file bytes directly
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata model rejected an insertion
    #[error("Metadata model error: {0}")]
    Model(#[from] nep_model::ModelError),

    /// Adapter configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Error category without payload, for matching in hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotThisFormat,
    MalformedHeader,
    UnsupportedType,
    InvalidRequest,
    NativeLibrary,
    NotPermitted,
    NotApplicable,
    BadHandle,
    Io,
    Model,
    Config,
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::NotThisFormat => ErrorKind::NotThisFormat,
            AdapterError::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            AdapterError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            AdapterError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            AdapterError::NativeLibrary { .. } => ErrorKind::NativeLibrary,
            AdapterError::NotPermitted { .. } => ErrorKind::NotPermitted,
            AdapterError::NotApplicable { .. } => ErrorKind::NotApplicable,
            AdapterError::BadHandle => ErrorKind::BadHandle,
            AdapterError::Io(_) => ErrorKind::Io,
            AdapterError::Model(_) => ErrorKind::Model,
            AdapterError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        AdapterError::MalformedHeader {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        AdapterError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn native(library: &'static str, source: NativeError) -> Self {
        AdapterError::NativeLibrary { library, source }
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_display() {
        let err = AdapterError::native("libtiff", NativeError::new("bad strip").with_status(-1));
        assert_eq!(err.kind(), ErrorKind::NativeLibrary);
        assert_eq!(err.to_string(), "libtiff error: bad strip (status -1)");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(AdapterError::NotThisFormat.kind(), ErrorKind::NotThisFormat);
        assert_eq!(
            AdapterError::NotPermitted { operation: "def_dim" }.kind(),
            ErrorKind::NotPermitted
        );
        assert_eq!(AdapterError::invalid("x").kind(), ErrorKind::InvalidRequest);
    }
}
