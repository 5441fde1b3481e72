//! # IronEDI Compiler
//!
//! Compiles EDI schema models into in-memory codecs.
//!
//! This crate provides:
//! - Compiled types with their write procedures
//! - Binding trees and the shared class registry
//! - JSON artifacts for every compiled model
//! - Interchange assembly and the compilation executor

pub mod artifacts;
pub mod binding;
pub mod class;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod interchange;
pub mod naming;
pub mod registry;
pub mod write;

pub use artifacts::{ArtifactRenderer, ArtifactWriter, Context, JsonRenderer, Template};
pub use binding::{BindingDescriptor, BindingId, BindingNode, BindingTree};
pub use class::{CompiledType, Property, PropertyDescriptor, PropertyKind, TypeDescriptor};
pub use compiler::{ClassModel, ClassModelCompiler, CompileOptions};
pub use error::CompileError;
pub use executor::{CompileReport, Executor, ExecutorBuilder};
pub use interchange::{InterchangeAssembly, InterchangeFactory, InterchangeFlavour, MessageDescriptor};
pub use registry::ClassRegistry;
pub use write::{WriteMethod, WriteStep};

/// Compiles a self-contained schema document into a class model.
///
/// # Arguments
/// * `xml` - Schema document content
/// * `namespace` - Target namespace
///
/// # Errors
/// Returns `CompileError` if parsing, validation or compilation fails.
pub fn compile_from_xml(xml: &str, namespace: &str) -> Result<ClassModel, CompileError> {
    let model = ironedi_schema::parse_model(xml)?;
    ironedi_schema::validate_model(&model)?;
    ClassModelCompiler::new(namespace).compile(&model, &mut ClassRegistry::new())
}

/// Compiles a self-contained schema document file into a class model.
///
/// # Arguments
/// * `path` - Path to the schema document
/// * `namespace` - Target namespace
///
/// # Errors
/// Returns `CompileError` if reading, parsing or compilation fails.
pub fn compile_from_file(path: &std::path::Path, namespace: &str) -> Result<ClassModel, CompileError> {
    let xml = std::fs::read_to_string(path)?;
    let mut model = compile_from_xml(&xml, namespace)?;
    model.source = Some(path.to_path_buf());
    Ok(model)
}
