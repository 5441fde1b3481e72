//! Registry of compiled types keyed by schema node identity.

use crate::class::CompiledType;
use ironedi_schema::SchemaNode;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps schema nodes to their compiled types.
///
/// Lookups use node identity (the `Arc` allocation), not structural
/// equality, so two messages referencing the same shared definitions node
/// resolve to the very same compiled type. The registry holds a reference to
/// every node it indexes, keeping the identity stable for its lifetime.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    entries: Vec<(Arc<SchemaNode>, Arc<CompiledType>)>,
    index: HashMap<usize, usize>,
}

fn identity(node: &Arc<SchemaNode>) -> usize {
    Arc::as_ptr(node) as usize
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the compiled type of a node.
    #[must_use]
    pub fn get(&self, node: &Arc<SchemaNode>) -> Option<&Arc<CompiledType>> {
        self.index
            .get(&identity(node))
            .map(|&idx| &self.entries[idx].1)
    }

    /// Returns true if the node has a compiled type.
    #[must_use]
    pub fn contains(&self, node: &Arc<SchemaNode>) -> bool {
        self.index.contains_key(&identity(node))
    }

    /// Registers the compiled type of a node. A node registered twice keeps
    /// its first type.
    pub fn insert(&mut self, node: Arc<SchemaNode>, compiled: Arc<CompiledType>) {
        let key = identity(&node);
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push((node, compiled));
    }

    /// Iterates compiled types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<CompiledType>> {
        self.entries.iter().map(|(_, t)| t)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::CompiledType;
    use crate::write::WriteMethod;
    use ironedi_schema::{Container, ContainerKind};

    fn compiled(name: &str) -> Arc<CompiledType> {
        Arc::new(CompiledType::new(
            name,
            "com.acme",
            name,
            ContainerKind::Segment,
            WriteMethod::default(),
        ))
    }

    #[test]
    fn test_lookup_by_identity() {
        let node: Arc<SchemaNode> = Container::segment("party", "NAD").into();
        let twin: Arc<SchemaNode> = Container::segment("party", "NAD").into();

        let mut registry = ClassRegistry::new();
        registry.insert(Arc::clone(&node), compiled("Party"));

        assert!(registry.contains(&node));
        assert!(!registry.contains(&twin));
        assert_eq!(registry.get(&Arc::clone(&node)).map(|t| t.name()), Some("Party"));
    }

    #[test]
    fn test_first_registration_wins() {
        let node: Arc<SchemaNode> = Container::new("g", ContainerKind::SegmentGroup).into();
        let first = compiled("First");

        let mut registry = ClassRegistry::new();
        registry.insert(Arc::clone(&node), Arc::clone(&first));
        registry.insert(Arc::clone(&node), compiled("Second"));

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(registry.get(&node).unwrap(), &first));
        assert_eq!(registry.types().count(), 1);
    }
}
