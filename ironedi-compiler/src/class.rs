//! Compiled data-holder types.
//!
//! A [`CompiledType`] is the in-memory counterpart of a schema container: a
//! named set of properties plus the [`WriteMethod`] that serializes a bean
//! of that type. Compiled types are immutable once built and are shared via
//! `Arc` between every message that references them.

use crate::write::{WriteMethod, WriteStep};
use ironedi_core::{Bean, DataEncoder, DataType, Delimiters, EdiEncoder, EncoderConfig};
use ironedi_schema::{ContainerKind, Occurs};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Compiled type for one schema container.
#[derive(Debug)]
pub struct CompiledType {
    name: String,
    namespace: String,
    node_name: String,
    kind: ContainerKind,
    write_method: WriteMethod,
}

impl CompiledType {
    /// Creates a compiled type.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        node_name: impl Into<String>,
        kind: ContainerKind,
        write_method: WriteMethod,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            node_name: node_name.into(),
            kind,
            write_method,
        }
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace the type was compiled into.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the fully qualified name (`namespace.Name`).
    #[must_use]
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Returns the schema node name the type was compiled from.
    #[must_use]
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Returns the container kind.
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Returns the write procedure.
    #[must_use]
    pub fn write_method(&self) -> &WriteMethod {
        &self.write_method
    }

    /// Iterates properties in schema order: delimited children first, then
    /// nested segments.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.write_method.steps().map(WriteStep::property)
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties().find(|p| p.name == name)
    }

    /// Returns the serializable descriptor of the type.
    #[must_use]
    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name.clone(),
            fqn: self.fqn(),
            node: self.node_name.clone(),
            kind: self.kind.element_name(),
            segment_code: self.write_method.code().map(str::to_string),
            truncatable: self.write_method.truncates(),
            properties: self.properties().map(Property::descriptor).collect(),
        }
    }
}

impl EdiEncoder for CompiledType {
    fn encode(
        &self,
        bean: &Bean,
        writer: &mut dyn Write,
        delimiters: &Delimiters,
    ) -> ironedi_core::Result<()> {
        self.write_method.write(bean, writer, delimiters)
    }
}

/// Property of a compiled type.
#[derive(Debug, Clone)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Schema node name.
    pub node_name: String,
    /// Occurrence bounds.
    pub occurs: Occurs,
    /// Value shape.
    pub kind: PropertyKind,
}

impl Property {
    /// Returns the serializable descriptor of the property.
    #[must_use]
    pub fn descriptor(&self) -> PropertyDescriptor {
        let (type_name, data_type, encoder_options) = match &self.kind {
            PropertyKind::Bean(t) => (Some(t.fqn()), None, None),
            PropertyKind::Value {
                data_type,
                parameters,
                ..
            } => (
                None,
                data_type.map(|d| d.name()),
                (!parameters.is_empty()).then(|| parameters.clone()),
            ),
        };
        PropertyDescriptor {
            name: self.name.clone(),
            node: self.node_name.clone(),
            min_occurs: self.occurs.min,
            max_occurs: self.occurs.max,
            type_name,
            data_type,
            encoder_options,
        }
    }

    /// Returns the compiled type of a bean property.
    #[must_use]
    pub fn bean_type(&self) -> Option<&Arc<CompiledType>> {
        match &self.kind {
            PropertyKind::Bean(t) => Some(t),
            PropertyKind::Value { .. } => None,
        }
    }
}

/// Value shape of a property.
#[derive(Debug, Clone)]
pub enum PropertyKind {
    /// Scalar, rendered by an encoder or by default stringification.
    Value {
        /// Encoder kind.
        data_type: Option<DataType>,
        /// Encoder options.
        parameters: EncoderConfig,
        /// Encoder configured at construction.
        encoder: Option<Arc<dyn DataEncoder>>,
    },
    /// Nested bean of a compiled type.
    Bean(Arc<CompiledType>),
}

/// Serialized form of a compiled type.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Fully qualified name.
    pub fqn: String,
    /// Schema node name.
    pub node: String,
    /// Container kind.
    pub kind: &'static str,
    /// Segment code, for segments with fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_code: Option<String>,
    /// Whether trailing empty children are truncated.
    pub truncatable: bool,
    /// Properties in schema order.
    pub properties: Vec<PropertyDescriptor>,
}

/// Serialized form of a property.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Schema node name.
    pub node: String,
    /// Minimum occurrences.
    pub min_occurs: u32,
    /// Maximum occurrences, `null` when unbounded.
    pub max_occurs: Option<u32>,
    /// Fully qualified bean type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Encoder kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<&'static str>,
    /// Encoder options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder_options: Option<EncoderConfig>,
}
