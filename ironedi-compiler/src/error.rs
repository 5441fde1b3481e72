//! Error types for model compilation.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for compilation runs.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Schema parsing error.
    #[error("schema parse error: {0}")]
    Parse(#[from] ironedi_schema::ParseError),

    /// Schema location, loading or validation error.
    #[error("schema error: {0}")]
    Schema(#[from] ironedi_schema::SchemaError),

    /// Delimiter, encoder or encode error.
    #[error(transparent)]
    Core(#[from] ironedi_core::Error),

    /// Schema name that cannot become a type, property or namespace
    /// identifier.
    #[error("illegal identifier '{name}': {reason}")]
    IllegalIdentifier {
        /// Name as found in the schema.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Destination exists but is not a directory.
    #[error("destination '{}' is not a directory", path.display())]
    DestinationNotDirectory {
        /// Destination path.
        path: PathBuf,
    },

    /// Interchange type without a factory flavour.
    #[error("unknown interchange type '{name}'")]
    UnknownInterchangeType {
        /// Interchange type as declared.
        name: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact serialization error.
    #[error("artifact serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    /// Creates an illegal identifier error.
    pub fn illegal_identifier(name: impl Into<String>, reason: &'static str) -> Self {
        Self::IllegalIdentifier {
            name: name.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::illegal_identifier("type", "reserved word");
        assert_eq!(err.to_string(), "illegal identifier 'type': reserved word");

        let err = CompileError::DestinationNotDirectory {
            path: PathBuf::from("/tmp/out.txt"),
        };
        assert_eq!(err.to_string(), "destination '/tmp/out.txt' is not a directory");
    }

    #[test]
    fn test_wraps_schema_error() {
        let err: CompileError = ironedi_schema::SchemaError::MissingProperty { name: "namespace" }.into();
        assert!(matches!(err, CompileError::Schema(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
