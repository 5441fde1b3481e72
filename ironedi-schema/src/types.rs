//! Schema node definitions.
//!
//! This module contains the tree a schema document is parsed into: segment
//! groups, segments, composite fields and components (containers), and the
//! scalar value leaves they hold.

use ironedi_core::{DataType, DelimiterType, EncoderConfig};
use std::fmt;
use std::sync::Arc;

/// Node of a schema tree.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// Node with ordered children.
    Container(Container),
    /// Scalar leaf.
    Value(ValueNode),
}

impl SchemaNode {
    /// Returns the node name (its `xmltag`).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Container(c) => &c.name,
            Self::Value(v) => &v.name,
        }
    }

    /// Returns the delimiter level written before this node's content.
    #[must_use]
    pub fn level(&self) -> DelimiterType {
        match self {
            Self::Container(c) => c.kind.level(),
            Self::Value(v) => v.level,
        }
    }

    /// Returns the container if this is a container node.
    #[must_use]
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(c) => Some(c),
            Self::Value(_) => None,
        }
    }

    /// Returns the value leaf if this is a value node.
    #[must_use]
    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            Self::Value(v) => Some(v),
            Self::Container(_) => None,
        }
    }

    /// Returns true for segments and segment groups.
    #[must_use]
    pub fn is_segment_like(&self) -> bool {
        matches!(
            self,
            Self::Container(Container {
                kind: ContainerKind::Segment | ContainerKind::SegmentGroup,
                ..
            })
        )
    }
}

/// Container node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Group of segments, without a code of its own.
    SegmentGroup,
    /// Segment: a code token followed by fields, optionally with nested
    /// child segments.
    Segment,
    /// Composite field holding components.
    Field,
    /// Composite component holding sub-components.
    Component,
}

impl ContainerKind {
    /// Returns the delimiter level of the container itself.
    #[must_use]
    pub const fn level(&self) -> DelimiterType {
        match self {
            Self::SegmentGroup | Self::Segment => DelimiterType::Segment,
            Self::Field => DelimiterType::Field,
            Self::Component => DelimiterType::Component,
        }
    }

    /// Returns the delimiter level separating the container's delimited
    /// children, if it has any.
    #[must_use]
    pub const fn child_level(&self) -> Option<DelimiterType> {
        match self {
            Self::SegmentGroup => None,
            Self::Segment => Some(DelimiterType::Field),
            Self::Field => Some(DelimiterType::Component),
            Self::Component => Some(DelimiterType::SubComponent),
        }
    }

    /// Returns the schema-document element name of the kind.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::SegmentGroup => "segmentGroup",
            Self::Segment => "segment",
            Self::Field => "field",
            Self::Component => "component",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Container node.
#[derive(Debug, Clone)]
pub struct Container {
    /// Node name.
    pub name: String,
    /// Container kind.
    pub kind: ContainerKind,
    /// Segment code (segments only).
    pub code: Option<String>,
    /// Delimited children: fields of a segment, components of a field,
    /// sub-components of a component.
    pub children: Vec<SchemaChild>,
    /// Nested segments of a segment or members of a segment group.
    pub segments: Vec<SchemaChild>,
    /// Drop trailing empty child tokens when writing.
    pub truncatable: bool,
    /// Free-text description.
    pub documentation: Option<String>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            code: None,
            children: Vec::new(),
            segments: Vec::new(),
            truncatable: false,
            documentation: None,
        }
    }

    /// Creates a segment with the given code.
    #[must_use]
    pub fn segment(name: impl Into<String>, code: impl Into<String>) -> Self {
        let mut segment = Self::new(name, ContainerKind::Segment);
        segment.code = Some(code.into());
        segment
    }

    /// Sets the truncatable flag (builder style).
    #[must_use]
    pub fn truncatable(mut self, truncatable: bool) -> Self {
        self.truncatable = truncatable;
        self
    }

    /// Appends a delimited child (builder style).
    #[must_use]
    pub fn with_child(mut self, occurs: Occurs, node: impl Into<Arc<SchemaNode>>) -> Self {
        self.children.push(SchemaChild::new(occurs, node));
        self
    }

    /// Appends a nested segment (builder style).
    #[must_use]
    pub fn with_segment(mut self, occurs: Occurs, node: impl Into<Arc<SchemaNode>>) -> Self {
        self.segments.push(SchemaChild::new(occurs, node));
        self
    }

    /// Returns true if the container writes anything of its own.
    ///
    /// Segments without fields are written as pass-through: neither code nor
    /// terminator, only their nested segments.
    #[must_use]
    pub fn has_fields(&self) -> bool {
        !self.children.is_empty()
    }

    /// Finds a segment by code among this container's nested segments,
    /// searching depth-first.
    #[must_use]
    pub fn find_segment(&self, code: &str) -> Option<&Arc<SchemaNode>> {
        for child in &self.segments {
            if let SchemaNode::Container(c) = child.node.as_ref() {
                if c.code.as_deref() == Some(code) {
                    return Some(&child.node);
                }
                if let Some(found) = c.find_segment(code) {
                    return Some(found);
                }
            }
        }
        None
    }
}

impl From<Container> for SchemaNode {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

impl From<Container> for Arc<SchemaNode> {
    fn from(container: Container) -> Self {
        Arc::new(SchemaNode::Container(container))
    }
}

/// Scalar leaf node.
#[derive(Debug, Clone)]
pub struct ValueNode {
    /// Node name.
    pub name: String,
    /// Delimiter level of the leaf (field, component or sub-component).
    pub level: DelimiterType,
    /// Encoder kind, or `None` for default stringification.
    pub data_type: Option<DataType>,
    /// Encoder options.
    pub parameters: EncoderConfig,
}

impl ValueNode {
    /// Creates a leaf without an encoder.
    #[must_use]
    pub fn new(name: impl Into<String>, level: DelimiterType) -> Self {
        Self {
            name: name.into(),
            level,
            data_type: None,
            parameters: EncoderConfig::new(),
        }
    }

    /// Sets the encoder kind and options (builder style).
    #[must_use]
    pub fn with_encoder(mut self, data_type: DataType, parameters: EncoderConfig) -> Self {
        self.data_type = Some(data_type);
        self.parameters = parameters;
        self
    }
}

impl From<ValueNode> for Arc<SchemaNode> {
    fn from(value: ValueNode) -> Self {
        Arc::new(SchemaNode::Value(value))
    }
}

/// Occurrence bounds of a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum occurrences.
    pub min: u32,
    /// Maximum occurrences, `None` when unbounded.
    pub max: Option<u32>,
}

impl Default for Occurs {
    fn default() -> Self {
        Self::REQUIRED
    }
}

impl Occurs {
    /// Exactly one occurrence.
    pub const REQUIRED: Self = Self {
        min: 1,
        max: Some(1),
    };

    /// Zero or one occurrence.
    pub const OPTIONAL: Self = Self {
        min: 0,
        max: Some(1),
    };

    /// Creates bounds.
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Returns true if more than one occurrence is allowed.
    #[must_use]
    pub const fn is_repeating(&self) -> bool {
        !matches!(self.max, Some(0 | 1))
    }

    /// Returns true if the child may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Parses a `maxOccurs` attribute value (`-1` and `unbounded` mean no
    /// limit).
    #[must_use]
    pub fn parse_max(s: &str) -> Option<Option<u32>> {
        match s.trim() {
            "-1" | "unbounded" => Some(None),
            other => other.parse().ok().map(Some),
        }
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// Parent-to-child edge with the child's occurrence bounds.
///
/// Bounds live on the edge so that a node imported from a shared definitions
/// model keeps a single identity while each referencing site states its own
/// bounds.
#[derive(Debug, Clone)]
pub struct SchemaChild {
    /// Occurrence bounds at this site.
    pub occurs: Occurs,
    /// Child node.
    pub node: Arc<SchemaNode>,
}

impl SchemaChild {
    /// Creates an edge.
    #[must_use]
    pub fn new(occurs: Occurs, node: impl Into<Arc<SchemaNode>>) -> Self {
        Self {
            occurs,
            node: node.into(),
        }
    }
}
