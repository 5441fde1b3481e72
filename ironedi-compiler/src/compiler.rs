//! Class/binding compiler.
//!
//! Walks a schema model depth-first and produces a [`ClassModel`]: one
//! [`CompiledType`] per container node, each with its write procedure, plus
//! the binding tree of the model. Container nodes already present in the
//! [`ClassRegistry`] are reused instead of compiled again, which is how
//! messages share the types of a definitions model.

use crate::binding::BindingTree;
use crate::class::{CompiledType, Property, PropertyKind};
use crate::error::CompileError;
use crate::naming::{NameScope, property_identifier, type_identifier, validate_namespace};
use crate::registry::ClassRegistry;
use crate::write::{WriteMethod, WriteStep};
use ironedi_core::{Bean, DelimiterType, Delimiters, EdiEncoder};
use ironedi_schema::{
    Container, ContainerKind, Description, ParseError, SchemaChild, SchemaModel, SchemaNode,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Artifact and write-procedure options of one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Write `binding-config.json`.
    pub binding_config: bool,
    /// Write `codec-config.json`.
    pub codec_config: bool,
    /// Write the `<Root>Factory.json` root factory.
    pub root_factory: bool,
    /// Flush the destination after every segment terminator.
    pub flush_segments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::STANDALONE
    }
}

impl CompileOptions {
    /// Standalone message: every artifact.
    pub const STANDALONE: Self = Self {
        binding_config: true,
        codec_config: true,
        root_factory: true,
        flush_segments: false,
    };

    /// Shared definitions: types only.
    pub const DEFINITIONS: Self = Self {
        binding_config: false,
        codec_config: false,
        root_factory: false,
        flush_segments: false,
    };

    /// Interchange message: codec configuration and root factory move to
    /// interchange assembly.
    pub const INTERCHANGE_MESSAGE: Self = Self {
        binding_config: true,
        codec_config: false,
        root_factory: false,
        flush_segments: false,
    };

    /// Returns a copy with segment flushing set.
    #[must_use]
    pub const fn with_flush_segments(mut self, flush: bool) -> Self {
        self.flush_segments = flush;
        self
    }
}

/// Result of compiling one schema model.
#[derive(Debug)]
pub struct ClassModel {
    /// Model description.
    pub description: Description,
    /// Namespace the model was compiled into.
    pub namespace: String,
    /// Delimiters declared by the model.
    pub delimiters: Delimiters,
    /// Compiled type of the root node.
    pub root: Arc<CompiledType>,
    /// Types created by this compilation (reused types excluded), in
    /// creation order.
    pub types: Vec<Arc<CompiledType>>,
    /// Binding tree of the model.
    pub bindings: BindingTree,
    /// Options the model was compiled with.
    pub options: CompileOptions,
    /// Source document of the model.
    pub source: Option<PathBuf>,
}

impl ClassModel {
    /// Encodes a root bean with the model's own delimiters.
    ///
    /// # Errors
    /// Returns an error if the bean does not fit the model or the writer
    /// fails.
    pub fn encode(&self, bean: &Bean, writer: &mut dyn Write) -> ironedi_core::Result<()> {
        self.root.encode(bean, writer, &self.delimiters)
    }

    /// Encodes a root bean into a string with the model's own delimiters.
    ///
    /// # Errors
    /// Same as [`ClassModel::encode`].
    pub fn encode_to_string(&self, bean: &Bean) -> ironedi_core::Result<String> {
        self.root.encode_to_string(bean, &self.delimiters)
    }
}

/// Compiles schema models into class models.
///
/// # Example
/// ```ignore
/// let mut registry = ClassRegistry::new();
/// let model = ClassModelCompiler::new("com.acme.orders")
///     .options(CompileOptions::STANDALONE)
///     .compile(&schema_model, &mut registry)?;
/// ```
#[derive(Debug, Clone)]
pub struct ClassModelCompiler {
    namespace: String,
    options: CompileOptions,
}

impl ClassModelCompiler {
    /// Creates a compiler targeting a namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            options: CompileOptions::default(),
        }
    }

    /// Sets the compile options (builder style).
    #[must_use]
    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Compiles a model.
    ///
    /// Container nodes found in `registry` reuse their compiled type; every
    /// newly compiled type is added to it.
    ///
    /// # Errors
    /// Returns [`CompileError::IllegalIdentifier`] for names that cannot
    /// become identifiers, or an encoder construction error.
    pub fn compile(
        &self,
        model: &SchemaModel,
        registry: &mut ClassRegistry,
    ) -> Result<ClassModel, CompileError> {
        validate_namespace(&self.namespace)?;

        let mut session = Session {
            namespace: &self.namespace,
            options: self.options,
            registry,
            type_names: NameScope::new(),
            created: Vec::new(),
        };
        let root = session.compile_node(&model.root)?;
        let created = session.created;

        tracing::info!(
            "Compiled model {} into {} ({} new types)",
            model.description,
            self.namespace,
            created.len()
        );

        Ok(ClassModel {
            description: model.description.clone(),
            namespace: self.namespace.clone(),
            delimiters: model.delimiters.clone(),
            bindings: BindingTree::build(&root),
            root,
            types: created,
            options: self.options,
            source: model.source.clone(),
        })
    }
}

struct Session<'a> {
    namespace: &'a str,
    options: CompileOptions,
    registry: &'a mut ClassRegistry,
    type_names: NameScope,
    created: Vec<Arc<CompiledType>>,
}

impl Session<'_> {
    fn compile_node(&mut self, node: &Arc<SchemaNode>) -> Result<Arc<CompiledType>, CompileError> {
        if let Some(existing) = self.registry.get(node) {
            tracing::debug!("Reusing {} for node '{}'", existing.fqn(), node.name());
            return Ok(Arc::clone(existing));
        }
        let SchemaNode::Container(container) = node.as_ref() else {
            return Err(ParseError::structure(format!(
                "value node '{}' cannot be compiled into a type",
                node.name()
            ))
            .into());
        };

        let name = self
            .type_names
            .claim(type_identifier(&container.name)?, "");
        let write_method = self.write_method(container)?;
        let compiled = Arc::new(CompiledType::new(
            name,
            self.namespace,
            &container.name,
            container.kind,
            write_method,
        ));

        self.registry.insert(Arc::clone(node), Arc::clone(&compiled));
        self.created.push(Arc::clone(&compiled));
        Ok(compiled)
    }

    fn write_method(&mut self, container: &Container) -> Result<WriteMethod, CompileError> {
        let mut properties = NameScope::new();
        let mut method = WriteMethod::new();

        let writes_code = container.kind == ContainerKind::Segment && container.has_fields();
        if writes_code {
            if let Some(code) = &container.code {
                method = method.segment_code(code);
            }
        }

        if let Some(child_level) = container.kind.child_level() {
            for (i, child) in container.children.iter().enumerate() {
                let property = self.property(&mut properties, child)?;
                let leading = (i > 0 || writes_code).then_some(child_level);
                method = method.body_step(WriteStep::delimited(property, leading, child_level));
            }
            if container.truncatable && container.has_fields() {
                method = method.truncate_at(child_level);
            }
        }

        if writes_code {
            method = method.terminate_with(DelimiterType::Segment, self.options.flush_segments);
        }

        for child in &container.segments {
            let property = self.property(&mut properties, child)?;
            method = method.segment_step(WriteStep::segment(property));
        }
        Ok(method)
    }

    fn property(
        &mut self,
        scope: &mut NameScope,
        child: &SchemaChild,
    ) -> Result<Property, CompileError> {
        let name = scope.claim(property_identifier(child.node.name())?, "_");
        let kind = match child.node.as_ref() {
            SchemaNode::Container(_) => PropertyKind::Bean(self.compile_node(&child.node)?),
            SchemaNode::Value(value) => PropertyKind::Value {
                data_type: value.data_type,
                parameters: value.parameters.clone(),
                encoder: value
                    .data_type
                    .map(|data_type| data_type.build(&value.parameters))
                    .transpose()?,
            },
        };
        Ok(Property {
            name,
            node_name: child.node.name().to_string(),
            occurs: child.occurs,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironedi_schema::parse_model;

    const NAD_MESSAGE: &str = r#"<edimap>
        <description name="PARTIES" version="1"/>
        <delimiters segment="'" field="+" component=":" escape="?"/>
        <segments xmltag="Parties">
            <segment segcode="NAD" xmltag="nameAndAddress" truncatable="true">
                <field xmltag="mandatory" required="true"/>
                <field xmltag="optional1"/>
                <field xmltag="optional2"/>
            </segment>
        </segments>
    </edimap>"#;

    fn compile(xml: &str) -> ClassModel {
        let model = parse_model(xml).unwrap();
        ClassModelCompiler::new("com.acme.parties")
            .compile(&model, &mut ClassRegistry::new())
            .unwrap()
    }

    #[test]
    fn test_end_to_end_encode() {
        let model = compile(NAD_MESSAGE);
        let bean = Bean::new().with(
            "name_and_address",
            Bean::new()
                .with("mandatory", "MANDATORY")
                .with("optional1", "OPTIONAL1"),
        );
        assert_eq!(model.encode_to_string(&bean).unwrap(), "NAD+MANDATORY+OPTIONAL1'");
    }

    #[test]
    fn test_compiled_types() {
        let model = compile(NAD_MESSAGE);
        assert_eq!(model.root.fqn(), "com.acme.parties.Parties");
        assert_eq!(model.types.len(), 2);

        let nad = model.root.property("name_and_address").unwrap();
        let nad_type = nad.bean_type().unwrap();
        assert_eq!(nad_type.name(), "NameAndAddress");
        assert_eq!(nad_type.write_method().code(), Some("NAD"));
        assert!(nad_type.write_method().truncates());
        let names: Vec<_> = nad_type.properties().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mandatory", "optional1", "optional2"]);
    }

    #[test]
    fn test_binding_tree() {
        let model = compile(NAD_MESSAGE);
        let tree = &model.bindings;
        let root = tree.root();
        assert!(tree.is_root_bean(root));
        assert_eq!(tree.get(root).type_name.as_deref(), Some("com.acme.parties.Parties"));

        let id = tree.find("Parties/name_and_address/optional1").unwrap();
        assert!(!tree.is_root_bean(id));
        assert!(!tree.get(id).is_bean());
        let parent = tree.get(id).parent().unwrap();
        assert_eq!(tree.path(parent), "Parties/name_and_address");
        assert!(tree.get(parent).is_bean());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_name_collisions_get_suffixes() {
        let model = compile(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="Message">
                 <segment segcode="RFF" xmltag="reference"><field xmltag="id"/><field xmltag="ID"/></segment>
                 <segmentGroup xmltag="group">
                   <segment segcode="RFF" xmltag="reference"><field xmltag="id"/></segment>
                 </segmentGroup>
               </segments></edimap>"#,
        );
        let first = model.root.property("reference").unwrap().bean_type().unwrap();
        assert_eq!(first.name(), "Reference");
        let names: Vec<_> = first.properties().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "id_2"]);

        let group = model.root.property("group").unwrap().bean_type().unwrap();
        let second = group.property("reference").unwrap().bean_type().unwrap();
        assert_eq!(second.name(), "Reference2");
    }

    #[test]
    fn test_illegal_identifier_is_fatal() {
        let model = parse_model(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="Message">
                 <segment segcode="X" xmltag="x"><field xmltag="type"/></segment>
               </segments></edimap>"#,
        )
        .unwrap();
        let err = ClassModelCompiler::new("com.acme")
            .compile(&model, &mut ClassRegistry::new())
            .unwrap_err();
        assert!(matches!(err, CompileError::IllegalIdentifier { name, .. } if name == "type"));

        let model = parse_model(NAD_MESSAGE).unwrap();
        let err = ClassModelCompiler::new("com.2acme")
            .compile(&model, &mut ClassRegistry::new())
            .unwrap_err();
        assert!(matches!(err, CompileError::IllegalIdentifier { .. }));
    }

    #[test]
    fn test_invalid_encoder_options_fail_compilation() {
        let model = parse_model(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="Message">
                 <segment segcode="QTY" xmltag="quantity">
                   <field xmltag="amount" dataType="Integer" dataTypeParameters="scale=2"/>
                 </segment>
               </segments></edimap>"#,
        )
        .unwrap();
        let err = ClassModelCompiler::new("com.acme")
            .compile(&model, &mut ClassRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Core(ironedi_core::Error::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_shared_registry_reuses_types() {
        let model = parse_model(NAD_MESSAGE).unwrap();
        let mut registry = ClassRegistry::new();
        let first = ClassModelCompiler::new("com.acme.a")
            .compile(&model, &mut registry)
            .unwrap();
        let second = ClassModelCompiler::new("com.acme.b")
            .compile(&model, &mut registry)
            .unwrap();

        assert!(Arc::ptr_eq(&first.root, &second.root));
        assert_eq!(second.types.len(), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_pass_through_segment_and_composites() {
        let model = compile(
            r#"<edimap><description name="A" version="1"/>
               <segments xmltag="Message">
                 <segment segcode="LIN" xmltag="line">
                   <segment segcode="QTY" xmltag="quantity" maxOccurs="2">
                     <field xmltag="detail">
                       <component xmltag="qualifier" required="true"/>
                       <component xmltag="value" dataType="Integer"/>
                     </field>
                   </segment>
                 </segment>
               </segments></edimap>"#,
        );
        let bean = Bean::new().with(
            "line",
            Bean::new().with(
                "quantity",
                vec![
                    Bean::new().with("detail", Bean::new().with("qualifier", "21").with("value", 5)),
                    Bean::new().with("detail", Bean::new().with("qualifier", "47")),
                ],
            ),
        );
        assert_eq!(model.encode_to_string(&bean).unwrap(), "QTY+21:5'QTY+47:'");
    }

    #[test]
    fn test_flush_segments_option() {
        let model = parse_model(NAD_MESSAGE).unwrap();
        let compiled = ClassModelCompiler::new("com.acme")
            .options(CompileOptions::STANDALONE.with_flush_segments(true))
            .compile(&model, &mut ClassRegistry::new())
            .unwrap();
        assert!(compiled.options.flush_segments);
    }
}
