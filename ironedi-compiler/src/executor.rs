//! Compilation runs.
//!
//! An [`Executor`] loads a model set, compiles the shared definitions once
//! into `<namespace>.common`, then compiles each selected message against
//! the same [`ClassRegistry`] and writes its artifacts.

use crate::artifacts::{ArtifactWriter, binding_path};
use crate::compiler::{ClassModel, ClassModelCompiler, CompileOptions};
use crate::error::CompileError;
use crate::interchange::{InterchangeAssembly, InterchangeFactory, MessageDescriptor};
use crate::naming::{namespace_segment, validate_namespace};
use crate::registry::ClassRegistry;
use ironedi_schema::{ModelSet, SchemaError, load_model_set};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Namespace segment of the shared definitions.
pub const COMMON_NAMESPACE: &str = "common";

/// Builder for [`Executor`].
#[derive(Debug, Clone, Default)]
pub struct ExecutorBuilder {
    schema: Option<String>,
    base_dir: Option<PathBuf>,
    destination: Option<PathBuf>,
    namespace: Option<String>,
    messages: Option<String>,
    flush_segments: bool,
}

impl ExecutorBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root schema reference (path or `file:` URI).
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the directory relative references resolve against. Defaults to
    /// the current directory.
    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Sets the output root.
    #[must_use]
    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = Some(dir.into());
        self
    }

    /// Sets the base namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restricts compilation to a comma-separated list of message names.
    #[must_use]
    pub fn messages(mut self, filter: impl Into<String>) -> Self {
        self.messages = Some(filter.into());
        self
    }

    /// Flushes after every segment when encoding.
    #[must_use]
    pub fn flush_segments(mut self, flush: bool) -> Self {
        self.flush_segments = flush;
        self
    }

    /// Builds the executor.
    ///
    /// # Errors
    /// Returns [`SchemaError::MissingProperty`] if the schema, destination
    /// or namespace is not set, or [`CompileError::IllegalIdentifier`] for
    /// an invalid namespace.
    pub fn build(self) -> Result<Executor, CompileError> {
        let schema = self
            .schema
            .ok_or(SchemaError::MissingProperty { name: "schema" })?;
        let destination = self
            .destination
            .ok_or(SchemaError::MissingProperty { name: "destination" })?;
        let namespace = self
            .namespace
            .ok_or(SchemaError::MissingProperty { name: "namespace" })?;
        validate_namespace(&namespace)?;

        let filter = self.messages.map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        });

        Ok(Executor {
            schema,
            base_dir: self.base_dir.unwrap_or_else(|| PathBuf::from(".")),
            destination,
            namespace,
            filter,
            flush_segments: self.flush_segments,
        })
    }
}

/// One configured compilation run.
#[derive(Debug, Clone)]
pub struct Executor {
    schema: String,
    base_dir: PathBuf,
    destination: PathBuf,
    namespace: String,
    filter: Option<Vec<String>>,
    flush_segments: bool,
}

/// Outcome of a compilation run.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Compiled models in compilation order, definitions first.
    pub models: Vec<Arc<ClassModel>>,
    /// Written artifacts in write order.
    pub artifacts: Vec<PathBuf>,
    /// Root types listed in `classes.lst`.
    pub root_classes: Vec<String>,
    /// Interchange factory, if the model set is interchange-capable.
    pub interchange: Option<InterchangeFactory>,
}

impl CompileReport {
    /// Looks up a compiled message model by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&Arc<ClassModel>> {
        self.models.iter().find(|m| m.description.name == name)
    }
}

impl Executor {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Returns the output root.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns true if a message passes the name filter.
    #[must_use]
    pub fn selects(&self, message: &str) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == message))
    }

    /// Runs the compilation.
    ///
    /// # Errors
    /// Fails fast on the first schema, identifier or IO error; artifacts
    /// already written are left in place.
    pub fn execute(&self) -> Result<CompileReport, CompileError> {
        if self.destination.exists() && !self.destination.is_dir() {
            return Err(CompileError::DestinationNotDirectory {
                path: self.destination.clone(),
            });
        }
        fs::create_dir_all(&self.destination)?;

        let model_set = load_model_set(&self.schema, &self.base_dir)?;
        tracing::info!(
            "Compiling {} models from {} into {}",
            model_set.len(),
            self.schema,
            self.destination.display()
        );
        self.compile_set(&model_set)
    }

    /// Compiles an already loaded model set.
    ///
    /// # Errors
    /// Same as [`Executor::execute`], minus loading errors.
    pub fn compile_set(&self, model_set: &ModelSet) -> Result<CompileReport, CompileError> {
        let writer = ArtifactWriter::new(&self.destination);
        let mut registry = ClassRegistry::new();
        let mut report = CompileReport::default();

        if let Some(definitions) = model_set.definitions() {
            let namespace = format!("{}.{COMMON_NAMESPACE}", self.namespace);
            let model = ClassModelCompiler::new(namespace)
                .options(CompileOptions::DEFINITIONS.with_flush_segments(self.flush_segments))
                .compile(definitions, &mut registry)?;
            report.artifacts.extend(writer.write_model(&model)?);
            report.models.push(Arc::new(model));
        }

        // messages join an interchange only alongside shared definitions
        let interchange = model_set
            .interchange
            .as_ref()
            .filter(|_| model_set.definitions().is_some());
        let mut assembly = interchange.map(|props| InterchangeAssembly::new(props, &self.namespace));
        let options = if interchange.is_some() {
            CompileOptions::INTERCHANGE_MESSAGE
        } else {
            CompileOptions::STANDALONE
        }
        .with_flush_segments(self.flush_segments);

        for schema_model in model_set.messages() {
            let name = &schema_model.description.name;
            if !self.selects(name) {
                tracing::debug!("Skipping message {}", name);
                continue;
            }

            let namespace = format!("{}.{}", self.namespace, namespace_segment(name)?);
            let model = ClassModelCompiler::new(&namespace)
                .options(options)
                .compile(schema_model, &mut registry)?;
            report.artifacts.extend(writer.write_model(&model)?);
            let model = Arc::new(model);

            if let Some(assembly) = assembly.as_mut() {
                let root_type = model.root.fqn();
                report.root_classes.push(root_type.clone());
                assembly.record(
                    MessageDescriptor {
                        name: name.clone(),
                        binding_path: binding_path(&namespace),
                        root_type,
                    },
                    Arc::clone(&model),
                );
            }
            report.models.push(model);
        }

        report
            .artifacts
            .push(writer.write_class_list(&self.namespace, &report.root_classes)?);

        if let Some(assembly) = assembly.filter(|a| !a.is_empty()) {
            let (factory, written) = assembly.assemble(&writer)?;
            report.artifacts.extend(written);
            report.interchange = Some(factory);
        }

        tracing::info!(
            "Compiled {} models, {} types, {} artifacts",
            report.models.len(),
            registry.len(),
            report.artifacts.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironedi_core::Bean;
    use tempfile::TempDir;

    const ORDERS: &str = r#"<edimap>
        <description name="ORDERS" version="D03B"/>
        <delimiters segment="'" field="+" component=":" escape="?"/>
        <segments xmltag="Order">
            <segment segcode="BGM" xmltag="header"><field xmltag="number"/></segment>
        </segments>
    </edimap>"#;

    const DEFINITIONS: &str = r#"<edimap>
        <description name="__modelset_definitions" version="local"/>
        <delimiters segment="'" field="+" component=":" escape="?"/>
        <segments xmltag="Definitions">
            <segment segcode="NAD" xmltag="NameAndAddress" truncatable="true">
                <field xmltag="qualifier"/>
            </segment>
        </segments>
    </edimap>"#;

    const SHARED_ORDERS: &str = r#"<edimap>
        <import resource="definitions.xml" namespace="def"/>
        <description name="ORDERS" version="D03B"/>
        <delimiters segment="'" field="+" component=":" escape="?"/>
        <segments xmltag="Order">
            <segment segcode="BGM" xmltag="header"><field xmltag="number"/></segment>
            <segment segref="def:NAD" maxOccurs="5"/>
        </segments>
    </edimap>"#;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn manifest(models: &[&str]) -> String {
        let mut manifest = "[interchange]\ntype = \"UNEDIFACT\"\nversion = \"D03B\"\n".to_string();
        for model in models {
            manifest.push_str(&format!("\n[[models]]\npath = \"{model}\"\n"));
        }
        manifest
    }

    struct FlushCounter {
        out: Vec<u8>,
        flushes: usize,
    }

    impl std::io::Write for FlushCounter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_missing_properties() {
        let err = Executor::builder()
            .destination("out")
            .namespace("com.acme")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Schema(SchemaError::MissingProperty { name: "schema" })
        ));

        let err = Executor::builder()
            .schema("orders.xml")
            .namespace("com.acme")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Schema(SchemaError::MissingProperty { name: "destination" })
        ));

        let err = Executor::builder()
            .schema("orders.xml")
            .destination("out")
            .namespace("com.1acme")
            .build()
            .unwrap_err();
        assert!(matches!(err, CompileError::IllegalIdentifier { .. }));
    }

    #[test]
    fn test_message_filter() {
        let executor = Executor::builder()
            .schema("x.toml")
            .destination("out")
            .namespace("com.acme")
            .messages(" ORDERS, INVOIC ,")
            .build()
            .unwrap();
        assert!(executor.selects("ORDERS"));
        assert!(executor.selects("INVOIC"));
        assert!(!executor.selects("DESADV"));

        let executor = Executor::builder()
            .schema("x.toml")
            .destination("out")
            .namespace("com.acme")
            .build()
            .unwrap();
        assert!(executor.selects("DESADV"));
    }

    #[test]
    fn test_destination_must_be_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "orders.xml", ORDERS);
        write(dir.path(), "out", "not a directory");

        let err = Executor::builder()
            .schema("orders.xml")
            .base_dir(dir.path())
            .destination(dir.path().join("out"))
            .namespace("com.acme")
            .build()
            .unwrap()
            .execute()
            .unwrap_err();
        assert!(matches!(err, CompileError::DestinationNotDirectory { .. }));
    }

    #[test]
    fn test_standalone_run() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "orders.xml", ORDERS);
        let out = dir.path().join("out");

        let report = Executor::builder()
            .schema("orders.xml")
            .base_dir(dir.path())
            .destination(&out)
            .namespace("com.acme")
            .build()
            .unwrap()
            .execute()
            .unwrap();

        assert!(report.interchange.is_none());
        assert!(report.root_classes.is_empty());
        let ns_dir = out.join("com").join("acme").join("orders");
        for file in ["types.json", "binding-config.json", "codec-config.json", "OrderFactory.json"] {
            assert!(ns_dir.join(file).is_file(), "{file} missing");
        }
        let classes = out.join("com").join("acme").join("classes.lst");
        assert_eq!(fs::read_to_string(classes).unwrap(), "");

        let model = report.model("ORDERS").unwrap();
        assert_eq!(model.root.fqn(), "com.acme.orders.Order");
    }

    #[test]
    fn test_shared_segments_flush() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "definitions.xml", DEFINITIONS);
        write(dir.path(), "orders.xml", SHARED_ORDERS);
        write(dir.path(), "d03b.toml", &manifest(&["definitions.xml", "orders.xml"]));

        let report = Executor::builder()
            .schema("d03b.toml")
            .base_dir(dir.path())
            .destination(dir.path().join("out"))
            .namespace("com.acme")
            .flush_segments(true)
            .build()
            .unwrap()
            .execute()
            .unwrap();

        let bean = Bean::new()
            .with("header", Bean::new().with("number", "1"))
            .with(
                "name_and_address",
                vec![
                    Bean::new().with("qualifier", "BY"),
                    Bean::new().with("qualifier", "SU"),
                ],
            );
        let mut writer = FlushCounter {
            out: Vec::new(),
            flushes: 0,
        };
        report.model("ORDERS").unwrap().encode(&bean, &mut writer).unwrap();
        assert_eq!(writer.out, b"BGM+1'NAD+BY'NAD+SU'");
        assert_eq!(writer.flushes, 3);
    }

    #[test]
    fn test_interchange_requires_definitions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "orders.xml", ORDERS);
        write(dir.path(), "d03b.toml", &manifest(&["orders.xml"]));
        let out = dir.path().join("out");

        let report = Executor::builder()
            .schema("d03b.toml")
            .base_dir(dir.path())
            .destination(&out)
            .namespace("com.acme.d03b")
            .build()
            .unwrap()
            .execute()
            .unwrap();

        assert!(report.interchange.is_none());
        assert!(report.root_classes.is_empty());
        let base = out.join("com").join("acme").join("d03b");
        for file in ["codec-config.json", "OrderFactory.json"] {
            assert!(base.join("orders").join(file).is_file(), "{file} missing");
        }
        assert!(!base.join("D03BInterchangeFactory.json").exists());
        assert_eq!(fs::read_to_string(base.join("classes.lst")).unwrap(), "");
    }
}
