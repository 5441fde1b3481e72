//! # IronEDI Schema
//!
//! Flat-file message schema model, document parser and model set loader.
//!
//! This crate provides:
//! - The schema node hierarchy (segment groups, segments, composites, values)
//! - `edimap` XML document parsing with `segref` resolution
//! - Model set loading from documents or TOML manifests
//! - Schema validation

pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod types;
pub mod validation;

pub use error::{ParseError, SchemaError};
pub use loader::{Manifest, ManifestEntry, load_model_set, resolve_location};
pub use model::{
    DEFINITIONS_KEY, DEFINITIONS_NAME, DEFINITIONS_VERSION, Description, InterchangeProperties,
    ModelSet, SchemaModel,
};
pub use parser::{EdimapDocument, Element, Import, parse_edimap, parse_model};
pub use types::{Container, ContainerKind, Occurs, SchemaChild, SchemaNode, ValueNode};
pub use validation::validate_model;
