//! Schema validation utilities.
//!
//! This module checks built schema models for structural consistency before
//! they are handed to the compiler.

use crate::error::SchemaError;
use crate::model::SchemaModel;
use crate::types::{Container, ContainerKind, Occurs, SchemaChild, SchemaNode};
use ironedi_core::{DelimiterType, Delimiters};
use std::collections::HashSet;

/// Validates a schema model for correctness.
///
/// # Arguments
/// * `model` - The model to validate
///
/// # Errors
/// Returns `SchemaError` if validation fails.
pub fn validate_model(model: &SchemaModel) -> Result<(), SchemaError> {
    validate_delimiters(&model.delimiters)?;
    match model.root.as_ref() {
        SchemaNode::Container(root) if root.kind == ContainerKind::SegmentGroup => {
            validate_container(root)
        }
        other => Err(SchemaError::validation(format!(
            "root node '{}' of model '{}' must be a segment group",
            other.name(),
            model.description
        ))),
    }
}

/// Validates that structural delimiters are distinct.
fn validate_delimiters(delimiters: &Delimiters) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for level in DelimiterType::ALL {
        let delimiter = delimiters.get(level);
        if !level.is_structural() || delimiter.is_empty() {
            continue;
        }
        if !seen.insert(delimiter) {
            return Err(SchemaError::validation(format!(
                "delimiter '{delimiter}' used for more than one level ({level})"
            )));
        }
    }
    if let Some(escape) = delimiters.escape.as_deref() {
        if seen.contains(escape) {
            return Err(SchemaError::validation(format!(
                "escape '{escape}' is also used as a delimiter"
            )));
        }
    }
    Ok(())
}

fn validate_container(container: &Container) -> Result<(), SchemaError> {
    match container.kind {
        ContainerKind::SegmentGroup => {
            if !container.children.is_empty() {
                return Err(SchemaError::validation(format!(
                    "segment group '{}' cannot hold fields",
                    container.name
                )));
            }
        }
        ContainerKind::Segment => {
            if container.code.as_deref().is_none_or(str::is_empty) {
                return Err(SchemaError::validation(format!(
                    "segment '{}' has no segment code",
                    container.name
                )));
            }
        }
        ContainerKind::Field | ContainerKind::Component => {
            if container.children.is_empty() {
                return Err(SchemaError::validation(format!(
                    "composite {} '{}' has no children",
                    container.kind, container.name
                )));
            }
            if !container.segments.is_empty() {
                return Err(SchemaError::validation(format!(
                    "{} '{}' cannot hold segments",
                    container.kind, container.name
                )));
            }
        }
    }

    let child_level = container.kind.child_level();
    for child in &container.children {
        validate_occurs(&container.name, child)?;
        if Some(child.node.level()) != child_level {
            return Err(SchemaError::validation(format!(
                "'{}' at {} level cannot be a child of {} '{}'",
                child.node.name(),
                child.node.level(),
                container.kind,
                container.name
            )));
        }
        if let SchemaNode::Container(c) = child.node.as_ref() {
            validate_container(c)?;
        }
    }

    for child in &container.segments {
        validate_occurs(&container.name, child)?;
        match child.node.as_ref() {
            SchemaNode::Container(c) if child.node.is_segment_like() => validate_container(c)?,
            other => {
                return Err(SchemaError::validation(format!(
                    "'{}' is not a segment or segment group",
                    other.name()
                )));
            }
        }
    }

    Ok(())
}

fn validate_occurs(parent: &str, child: &SchemaChild) -> Result<(), SchemaError> {
    let Occurs { min, max } = child.occurs;
    match max {
        Some(0) => Err(SchemaError::validation(format!(
            "'{}' in '{parent}' has maxOccurs 0",
            child.node.name()
        ))),
        Some(max) if min > max => Err(SchemaError::validation(format!(
            "'{}' in '{parent}' has minOccurs {min} greater than maxOccurs {max}",
            child.node.name()
        ))),
        _ => Ok(()),
    }
}
