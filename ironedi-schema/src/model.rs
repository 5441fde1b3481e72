//! Schema models and model sets.

use crate::types::SchemaNode;
use ironedi_core::Delimiters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Description name of the shared definitions model.
pub const DEFINITIONS_NAME: &str = "__modelset_definitions";

/// Description version of the shared definitions model.
pub const DEFINITIONS_VERSION: &str = "local";

/// Lookup key of the shared definitions model.
pub const DEFINITIONS_KEY: &str = "__modelset_definitions:local";

/// Name and version of a schema model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Description {
    /// Model name.
    pub name: String,
    /// Model version.
    pub version: String,
}

impl Description {
    /// Creates a description.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Creates the description of a shared definitions model.
    #[must_use]
    pub fn definitions() -> Self {
        Self::new(DEFINITIONS_NAME, DEFINITIONS_VERSION)
    }

    /// Returns the `name:version` lookup key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    /// Returns true if this describes the shared definitions model.
    #[must_use]
    pub fn is_definitions(&self) -> bool {
        self.name == DEFINITIONS_NAME && self.version == DEFINITIONS_VERSION
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// One schema document.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    /// Name and version.
    pub description: Description,
    /// Delimiters declared by the document.
    pub delimiters: Delimiters,
    /// Root node (a segment group).
    pub root: Arc<SchemaNode>,
    /// Location the model was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl SchemaModel {
    /// Creates a model.
    #[must_use]
    pub fn new(description: Description, delimiters: Delimiters, root: Arc<SchemaNode>) -> Self {
        Self {
            description,
            delimiters,
            root,
            source: None,
        }
    }

    /// Returns the lookup key.
    #[must_use]
    pub fn key(&self) -> String {
        self.description.key()
    }

    /// Returns true if this is the shared definitions model.
    #[must_use]
    pub fn is_definitions(&self) -> bool {
        self.description.is_definitions()
    }
}

/// Interchange-level properties of a model set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeProperties {
    /// Interchange type, e.g. `UNEDIFACT` or `X12`.
    #[serde(rename = "type")]
    pub interchange_type: String,
    /// Message directory version, e.g. `D03B`.
    pub version: String,
}

impl InterchangeProperties {
    /// Creates interchange properties.
    #[must_use]
    pub fn new(interchange_type: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            interchange_type: interchange_type.into(),
            version: version.into(),
        }
    }
}

/// Models of one compiler invocation, keyed by description and kept in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    models: Vec<SchemaModel>,
    model_map: HashMap<String, usize>,
    /// Interchange properties, if the set is interchange-capable.
    pub interchange: Option<InterchangeProperties>,
}

impl ModelSet {
    /// Creates an empty model set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model. Returns false, leaving the set unchanged, if a model
    /// with the same key is already present.
    pub fn insert(&mut self, model: SchemaModel) -> bool {
        let key = model.key();
        if self.model_map.contains_key(&key) {
            return false;
        }
        self.model_map.insert(key, self.models.len());
        self.models.push(model);
        true
    }

    /// Looks up a model by `name:version` key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SchemaModel> {
        self.model_map.get(key).map(|&idx| &self.models[idx])
    }

    /// Returns the shared definitions model, if present.
    #[must_use]
    pub fn definitions(&self) -> Option<&SchemaModel> {
        self.get(DEFINITIONS_KEY)
    }

    /// Iterates message models (everything but the definitions model) in
    /// declaration order.
    pub fn messages(&self) -> impl Iterator<Item = &SchemaModel> {
        self.models.iter().filter(|m| !m.is_definitions())
    }

    /// Iterates all models in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaModel> {
        self.models.iter()
    }

    /// Returns the number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if the set holds no model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Returns true if the set carries interchange properties.
    #[must_use]
    pub fn is_interchange(&self) -> bool {
        self.interchange.is_some()
    }
}
