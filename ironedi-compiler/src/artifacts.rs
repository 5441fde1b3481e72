//! Artifact rendering.
//!
//! Compilation output is a set of JSON documents laid out by namespace
//! under an output root. Rendering goes through the [`ArtifactRenderer`]
//! seam; [`JsonRenderer`] is the default implementation.

use crate::compiler::ClassModel;
use crate::error::CompileError;
use crate::naming::{namespace_dir, namespace_path};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Named values handed to a template.
pub type Context = BTreeMap<&'static str, serde_json::Value>;

/// Artifact templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// Compiled type descriptors of one namespace.
    Types,
    /// Binding tree of one model.
    BindingConfig,
    /// Schema reference and delimiters of a standalone model.
    CodecConfig,
    /// Root type lookup of a standalone model.
    RootFactory,
    /// Aggregate of interchange message descriptors.
    MessageBindings,
    /// Interchange envelope and message list.
    InterchangeBindings,
    /// Interchange-type-specific message lookup.
    InterchangeFactory,
}

impl Template {
    /// Returns the template name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Types => "types",
            Self::BindingConfig => "binding-config",
            Self::CodecConfig => "codec-config",
            Self::RootFactory => "root-factory",
            Self::MessageBindings => "message-bindings",
            Self::InterchangeBindings => "interchange-bindings",
            Self::InterchangeFactory => "interchange-factory",
        }
    }
}

/// Renders a template with a context to a destination file.
pub trait ArtifactRenderer {
    /// Renders `template` to `destination`.
    ///
    /// The destination is flushed and closed whether rendering succeeds or
    /// not.
    ///
    /// # Errors
    /// Returns an error if the destination cannot be written.
    fn render(
        &self,
        template: Template,
        context: &Context,
        destination: &Path,
    ) -> Result<(), CompileError>;
}

/// Renders artifacts as pretty-printed JSON objects.
///
/// The object holds a `template` member followed by the context values in
/// key order, so equal contexts always render to identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ArtifactRenderer for JsonRenderer {
    fn render(
        &self,
        template: Template,
        context: &Context,
        destination: &Path,
    ) -> Result<(), CompileError> {
        let mut document = serde_json::Map::new();
        document.insert("template".to_string(), template.name().into());
        for (key, value) in context {
            document.insert((*key).to_string(), value.clone());
        }

        let mut out = BufWriter::new(File::create(destination)?);
        let written = serde_json::to_writer_pretty(&mut out, &document)
            .map_err(CompileError::from)
            .and_then(|()| out.write_all(b"\n").map_err(CompileError::from));
        let flushed = out.flush();
        written?;
        flushed?;
        Ok(())
    }
}

/// Lays out artifacts under an output root.
pub struct ArtifactWriter {
    root: PathBuf,
    renderer: Box<dyn ArtifactRenderer>,
}

impl std::fmt::Debug for ArtifactWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactWriter")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ArtifactWriter {
    /// Creates a writer using [`JsonRenderer`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_renderer(root, JsonRenderer)
    }

    /// Creates a writer with a custom renderer.
    #[must_use]
    pub fn with_renderer(root: impl Into<PathBuf>, renderer: impl ArtifactRenderer + 'static) -> Self {
        Self {
            root: root.into(),
            renderer: Box::new(renderer),
        }
    }

    /// Returns the output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory of a namespace, creating it if needed.
    ///
    /// # Errors
    /// Returns an IO error if the directory cannot be created.
    pub fn namespace_dir(&self, namespace: &str) -> Result<PathBuf, CompileError> {
        let dir = self.root.join(namespace_dir(namespace));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Renders one artifact into a namespace directory.
    ///
    /// # Errors
    /// Returns an error if the directory or the file cannot be written.
    pub fn render(
        &self,
        template: Template,
        context: &Context,
        namespace: &str,
        file_name: &str,
    ) -> Result<PathBuf, CompileError> {
        let destination = self.namespace_dir(namespace)?.join(file_name);
        self.renderer.render(template, context, &destination)?;
        tracing::debug!("Wrote {} artifact {}", template.name(), destination.display());
        Ok(destination)
    }

    /// Writes the artifacts of a compiled model, as selected by its
    /// options. `types.json` is always written.
    ///
    /// # Errors
    /// Returns an error if an artifact cannot be written.
    pub fn write_model(&self, model: &ClassModel) -> Result<Vec<PathBuf>, CompileError> {
        let namespace = model.namespace.as_str();
        let mut written = Vec::new();

        let types: Vec<_> = model.types.iter().map(|t| t.descriptor()).collect();
        let context = Context::from([
            ("namespace", json!(namespace)),
            ("model", json!(model.description)),
            ("types", serde_json::to_value(types)?),
        ]);
        written.push(self.render(Template::Types, &context, namespace, TYPES_FILE)?);

        if model.options.binding_config {
            let context = Context::from([
                ("model", json!(model.description)),
                ("root", json!(model.root.fqn())),
                ("bindings", serde_json::to_value(model.bindings.descriptor())?),
            ]);
            written.push(self.render(Template::BindingConfig, &context, namespace, BINDING_CONFIG_FILE)?);
        }

        if model.options.codec_config {
            let schema = model
                .source
                .as_ref()
                .map_or_else(|| model.description.key(), |p| p.display().to_string());
            let context = Context::from([
                ("schema", json!(schema)),
                ("delimiters", serde_json::to_value(&model.delimiters)?),
                ("root", json!(model.root.fqn())),
            ]);
            written.push(self.render(Template::CodecConfig, &context, namespace, CODEC_CONFIG_FILE)?);
        }

        if model.options.root_factory {
            let context = Context::from([
                ("root", json!(model.root.fqn())),
                ("bindingPath", json!(binding_path(namespace))),
                ("model", json!(model.description)),
            ]);
            let file_name = format!("{}Factory.json", model.root.name());
            written.push(self.render(Template::RootFactory, &context, namespace, &file_name)?);
        }

        Ok(written)
    }

    /// Writes `classes.lst` in a namespace directory, one fully qualified
    /// type name per line.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written.
    pub fn write_class_list(&self, namespace: &str, classes: &[String]) -> Result<PathBuf, CompileError> {
        let destination = self.namespace_dir(namespace)?.join(CLASS_LIST_FILE);
        let mut out = BufWriter::new(File::create(&destination)?);
        let written = classes.iter().try_for_each(|class| writeln!(out, "{class}"));
        let flushed = out.flush();
        written?;
        flushed?;
        Ok(destination)
    }
}

/// Compiled type descriptors of a namespace.
pub const TYPES_FILE: &str = "types.json";
/// Binding tree of a model.
pub const BINDING_CONFIG_FILE: &str = "binding-config.json";
/// Codec configuration of a standalone model.
pub const CODEC_CONFIG_FILE: &str = "codec-config.json";
/// Root type names of interchange messages.
pub const CLASS_LIST_FILE: &str = "classes.lst";

/// Returns the logical path of the binding configuration of a namespace.
#[must_use]
pub fn binding_path(namespace: &str) -> String {
    format!("{}/{BINDING_CONFIG_FILE}", namespace_path(namespace))
}
