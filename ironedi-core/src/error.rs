//! Error types for IronEDI core operations.

use thiserror::Error;

/// Core error type for IronEDI encoding operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A delimiter kind was named that the delimiter table does not know.
    #[error("unsupported delimiter type '{name}'")]
    UnsupportedDelimiter {
        /// Delimiter name as it was given.
        name: String,
    },

    /// Unknown value data type.
    #[error("unknown data type '{name}'")]
    UnknownDataType {
        /// Data type name as it was given.
        name: String,
    },

    /// Encoder option not part of the encoder's configuration schema.
    #[error("unknown option '{key}' for {encoder} encoder")]
    UnknownOption {
        /// Encoder kind.
        encoder: &'static str,
        /// Offending option key.
        key: String,
    },

    /// Encoder option with an unusable value.
    #[error("invalid value '{value}' for option '{key}' of {encoder} encoder")]
    InvalidOption {
        /// Encoder kind.
        encoder: &'static str,
        /// Option key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// Malformed `key=value` property list entry.
    #[error("invalid property list entry '{entry}'")]
    InvalidPropertyList {
        /// Offending entry.
        entry: String,
    },

    /// Value kind not accepted by an encoder.
    #[error("{encoder} encoder cannot encode a {found} value")]
    ValueMismatch {
        /// Encoder kind.
        encoder: &'static str,
        /// Kind of the supplied value.
        found: &'static str,
    },

    /// Property value shape does not match its binding.
    #[error("property '{property}' expects {expected}, found {found}")]
    PropertyMismatch {
        /// Property name.
        property: String,
        /// Expected value shape.
        expected: &'static str,
        /// Kind of the supplied value.
        found: &'static str,
    },

    /// More items supplied than the schema allows.
    #[error("property '{property}' has {found} occurrences, maximum is {max}")]
    TooManyOccurrences {
        /// Property name.
        property: String,
        /// Declared maximum.
        max: u32,
        /// Number of supplied items.
        found: usize,
    },

    /// Destination write failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for IronEDI core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TooManyOccurrences {
            property: "reference".to_string(),
            max: 3,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "property 'reference' has 4 occurrences, maximum is 3"
        );

        let err = Error::UnsupportedDelimiter {
            name: "record".to_string(),
        };
        assert!(err.to_string().contains("record"));
    }
}
