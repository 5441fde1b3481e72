//! Error types for schema parsing, loading and validation.

use thiserror::Error;

/// Error type for schema document parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Unknown element encountered.
    #[error("unknown element '{element}' in context '{context}'")]
    UnknownElement {
        /// Element name.
        element: String,
        /// Parent context.
        context: String,
    },

    /// Segment reference that matches no imported segment.
    #[error("unresolved segment reference '{reference}'")]
    UnresolvedReference {
        /// Reference as written.
        reference: String,
    },

    /// Invalid document structure.
    #[error("invalid schema structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// Delimiter or encoder declaration rejected by the core vocabulary.
    #[error(transparent)]
    Core(#[from] ironedi_core::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Error type for locating, loading and validating schema models.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Parsing error without location context.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Document that failed to parse.
    #[error("failed to parse '{location}': {source}")]
    Document {
        /// Document location.
        location: String,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },

    /// Document that could not be read.
    #[error("cannot read '{location}': {source}")]
    NotFound {
        /// Document location.
        location: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reference that is neither a path nor a `file:` URI.
    #[error("unsupported schema location '{location}'")]
    UnsupportedLocation {
        /// Location as given.
        location: String,
    },

    /// Malformed model-set manifest.
    #[error("invalid manifest '{location}': {source}")]
    Manifest {
        /// Manifest location.
        location: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Documents importing each other.
    #[error("circular import detected: {path}")]
    CircularReference {
        /// Import chain.
        path: String,
    },

    /// Two documents with the same `name:version` key.
    #[error("duplicate model '{key}'")]
    DuplicateModel {
        /// Model key.
        key: String,
    },

    /// Mandatory property not supplied.
    #[error("mandatory property '{name}' not specified")]
    MissingProperty {
        /// Property name.
        name: &'static str,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown element error.
    pub fn unknown_element(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
            context: context.into(),
        }
    }

    /// Creates an invalid structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

impl SchemaError {
    /// Attaches a document location to a parse error.
    pub fn document(location: impl Into<String>, source: ParseError) -> Self {
        Self::Document {
            location: location.into(),
            source,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::document(
            "orders.xml",
            ParseError::missing_attr("segment", "segcode"),
        );
        assert_eq!(
            err.to_string(),
            "failed to parse 'orders.xml': missing required attribute 'segcode' on element 'segment'"
        );

        let err = SchemaError::MissingProperty { name: "destDir" };
        assert_eq!(err.to_string(), "mandatory property 'destDir' not specified");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err = ParseError::from(ironedi_core::Error::UnsupportedDelimiter {
            name: "record".to_string(),
        });
        assert_eq!(err.to_string(), "unsupported delimiter type 'record'");
    }
}
