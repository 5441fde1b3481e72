//! Binding trees linking compiled types to schema nodes.
//!
//! A [`BindingTree`] mirrors the schema shape of one compiled model. Nodes
//! live in an arena and refer to their parent by [`BindingId`]; the root
//! node has no parent and is the root bean of the model.

use crate::class::{CompiledType, PropertyKind};
use ironedi_schema::Occurs;
use serde::Serialize;
use std::sync::Arc;

/// Index of a node in a [`BindingTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

/// Node of a binding tree.
#[derive(Debug, Clone)]
pub struct BindingNode {
    /// Schema node name.
    pub node_name: String,
    /// Bound property, absent for the root.
    pub property: Option<String>,
    /// Fully qualified type for bean nodes.
    pub type_name: Option<String>,
    /// Occurrence bounds at this site.
    pub occurs: Occurs,
    parent: Option<BindingId>,
    children: Vec<BindingId>,
}

impl BindingNode {
    /// Returns the parent node, absent for the root.
    #[must_use]
    pub fn parent(&self) -> Option<BindingId> {
        self.parent
    }

    /// Returns the child nodes in schema order.
    #[must_use]
    pub fn children(&self) -> &[BindingId] {
        &self.children
    }

    /// Returns true if this node binds a bean.
    #[must_use]
    pub fn is_bean(&self) -> bool {
        self.type_name.is_some()
    }
}

/// Binding tree of one compiled model.
#[derive(Debug, Clone)]
pub struct BindingTree {
    nodes: Vec<BindingNode>,
}

impl BindingTree {
    /// Builds the binding tree rooted at a compiled type.
    #[must_use]
    pub fn build(root: &Arc<CompiledType>) -> Self {
        let mut tree = Self {
            nodes: vec![BindingNode {
                node_name: root.node_name().to_string(),
                property: None,
                type_name: Some(root.fqn()),
                occurs: Occurs::REQUIRED,
                parent: None,
                children: Vec::new(),
            }],
        };
        tree.bind_properties(BindingId(0), root);
        tree
    }

    fn bind_properties(&mut self, parent: BindingId, compiled: &CompiledType) {
        for property in compiled.properties() {
            let id = BindingId(self.nodes.len());
            let bean_type = match &property.kind {
                PropertyKind::Bean(t) => Some(Arc::clone(t)),
                PropertyKind::Value { .. } => None,
            };
            self.nodes.push(BindingNode {
                node_name: property.node_name.clone(),
                property: Some(property.name.clone()),
                type_name: bean_type.as_ref().map(|t| t.fqn()),
                occurs: property.occurs,
                parent: Some(parent),
                children: Vec::new(),
            });
            self.nodes[parent.0].children.push(id);
            if let Some(t) = bean_type {
                self.bind_properties(id, &t);
            }
        }
    }

    /// Returns the root node id.
    #[must_use]
    pub fn root(&self) -> BindingId {
        BindingId(0)
    }

    /// Returns a node.
    #[must_use]
    pub fn get(&self, id: BindingId) -> &BindingNode {
        &self.nodes[id.0]
    }

    /// Returns true if `id` is the root bean of the model.
    #[must_use]
    pub fn is_root_bean(&self, id: BindingId) -> bool {
        self.nodes[id.0].parent.is_none()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds only its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Returns the `/`-separated property path from the root to `id`.
    #[must_use]
    pub fn path(&self, id: BindingId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = &self.nodes[cur.0];
            parts.push(node.property.as_deref().unwrap_or(&node.node_name));
            current = node.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Finds a node by its property path (as returned by [`Self::path`]).
    #[must_use]
    pub fn find(&self, path: &str) -> Option<BindingId> {
        let mut parts = path.split('/');
        let root = self.root();
        if parts.next() != Some(self.nodes[root.0].node_name.as_str()) {
            return None;
        }
        parts.try_fold(root, |id, part| {
            self.nodes[id.0]
                .children
                .iter()
                .copied()
                .find(|c| self.nodes[c.0].property.as_deref() == Some(part))
        })
    }

    /// Returns the serializable descriptor of the tree.
    #[must_use]
    pub fn descriptor(&self) -> BindingDescriptor {
        self.describe(self.root())
    }

    fn describe(&self, id: BindingId) -> BindingDescriptor {
        let node = &self.nodes[id.0];
        BindingDescriptor {
            node: node.node_name.clone(),
            property: node.property.clone(),
            type_name: node.type_name.clone(),
            min_occurs: node.occurs.min,
            max_occurs: node.occurs.max,
            children: node.children.iter().map(|&c| self.describe(c)).collect(),
        }
    }
}

/// Serialized form of a binding node and its subtree.
#[derive(Debug, Clone, Serialize)]
pub struct BindingDescriptor {
    /// Schema node name.
    pub node: String,
    /// Bound property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Fully qualified bean type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Minimum occurrences.
    pub min_occurs: u32,
    /// Maximum occurrences, `null` when unbounded.
    pub max_occurs: Option<u32>,
    /// Child bindings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BindingDescriptor>,
}
