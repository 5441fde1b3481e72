//! Model set loader.
//!
//! Resolves a root schema reference into a [`ModelSet`]. The root is either
//! an `edimap` document, whose imports are followed transitively, or a TOML
//! manifest listing model documents and interchange properties:
//!
//! ```toml
//! [interchange]
//! type = "UNEDIFACT"
//! version = "D03B"
//!
//! [[models]]
//! path = "definitions.xml"
//!
//! [[models]]
//! path = "orders.xml"
//! ```

use crate::error::SchemaError;
use crate::model::{InterchangeProperties, ModelSet, SchemaModel};
use crate::parser::parse_edimap;
use crate::types::SchemaNode;
use crate::validation::validate_model;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Model-set manifest document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Interchange properties.
    #[serde(default)]
    pub interchange: Option<InterchangeProperties>,
    /// Model documents, in declaration order.
    #[serde(default)]
    pub models: Vec<ManifestEntry>,
}

/// Model document listed by a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Document location, relative to the manifest.
    pub path: String,
}

/// Loads a model set from a root reference.
///
/// # Arguments
/// * `reference` - Path or `file:` URI of the root document
/// * `base` - Location relative references are resolved against
///
/// # Errors
/// Returns `SchemaError` if a document cannot be located, parsed or
/// validated.
pub fn load_model_set(reference: &str, base: &Path) -> Result<ModelSet, SchemaError> {
    let location = resolve_location(reference, base)?;
    let mut loader = ModelSetLoader::default();

    if location.extension().is_some_and(|ext| ext == "toml") {
        loader.load_manifest(&location)?;
    } else {
        loader.load_document(&location)?;
    }

    let mut set = loader.set;
    if set.interchange.is_none() {
        set.interchange = loader.declared_interchange;
    }
    tracing::info!(
        "Loaded model set from {} ({} models, definitions: {}, interchange: {})",
        location.display(),
        set.len(),
        set.definitions().is_some(),
        set.is_interchange()
    );
    Ok(set)
}

/// Resolves a reference to a filesystem path.
///
/// Plain paths are resolved against `base`; `file:` URIs are converted
/// directly. Any other URI scheme is rejected.
///
/// # Errors
/// Returns [`SchemaError::UnsupportedLocation`] for other URI schemes or
/// malformed `file:` URIs.
pub fn resolve_location(reference: &str, base: &Path) -> Result<PathBuf, SchemaError> {
    let unsupported = || SchemaError::UnsupportedLocation {
        location: reference.to_string(),
    };

    match Url::parse(reference) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|()| unsupported()),
        // single-letter schemes are drive letters
        Ok(url) if url.scheme().len() > 1 => Err(unsupported()),
        _ => {
            let path = Path::new(reference);
            Ok(if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            })
        }
    }
}

#[derive(Debug, Default)]
struct ModelSetLoader {
    set: ModelSet,
    declared_interchange: Option<InterchangeProperties>,
    loaded: HashMap<PathBuf, Arc<SchemaNode>>,
    in_progress: Vec<PathBuf>,
}

impl ModelSetLoader {
    fn load_manifest(&mut self, location: &Path) -> Result<(), SchemaError> {
        let content = read(location)?;
        let manifest: Manifest =
            toml::from_str(&content).map_err(|source| SchemaError::Manifest {
                location: location.display().to_string(),
                source,
            })?;

        self.set.interchange = manifest.interchange;
        let dir = parent_dir(location);
        for entry in &manifest.models {
            let path = resolve_location(&entry.path, &dir)?;
            self.load_document(&path)?;
        }
        Ok(())
    }

    /// Loads a document after its imports, returning its root node.
    fn load_document(&mut self, location: &Path) -> Result<Arc<SchemaNode>, SchemaError> {
        let key = normalize(location);
        if let Some(root) = self.loaded.get(&key) {
            return Ok(Arc::clone(root));
        }
        if self.in_progress.contains(&key) {
            let mut chain: Vec<String> = self
                .in_progress
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(key.display().to_string());
            return Err(SchemaError::CircularReference {
                path: chain.join(" -> "),
            });
        }

        let location_str = location.display().to_string();
        let document = parse_edimap(&read(location)?)
            .map_err(|source| SchemaError::document(&location_str, source))?;
        tracing::debug!(
            "Parsed {} ({}, {} imports)",
            location_str,
            document.description,
            document.imports.len()
        );

        self.in_progress.push(key.clone());
        let dir = parent_dir(location);
        let mut imported = HashMap::new();
        for import in &document.imports {
            let path = resolve_location(&import.resource, &dir)?;
            let root = self.load_document(&path)?;
            imported.insert(import.namespace.clone(), root);
        }
        self.in_progress.pop();

        let mut model: SchemaModel = document
            .build(&imported)
            .map_err(|source| SchemaError::document(&location_str, source))?;
        model.source = Some(location.to_path_buf());
        validate_model(&model)?;

        if self.declared_interchange.is_none() {
            self.declared_interchange = document.interchange.clone();
        }

        let root = Arc::clone(&model.root);
        let model_key = model.key();
        if !self.set.insert(model) {
            return Err(SchemaError::DuplicateModel { key: model_key });
        }
        self.loaded.insert(key, Arc::clone(&root));
        Ok(root)
    }
}

fn read(location: &Path) -> Result<String, SchemaError> {
    std::fs::read_to_string(location).map_err(|source| SchemaError::NotFound {
        location: location.display().to_string(),
        source,
    })
}

fn parent_dir(location: &Path) -> PathBuf {
    location
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn normalize(location: &Path) -> PathBuf {
    location
        .canonicalize()
        .unwrap_or_else(|_| location.to_path_buf())
}
