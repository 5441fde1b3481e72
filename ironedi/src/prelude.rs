//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use ironedi::prelude::*;
//! ```

// Core types
pub use ironedi_core::error::{Error as CoreError, Result as CoreResult};
pub use ironedi_core::{
    Bean, DataEncoder, DataType, DelimiterType, Delimiters, EdiEncoder, EncoderConfig, Value,
};

// Schema types
pub use ironedi_schema::{
    Container, ContainerKind, ModelSet, Occurs, ParseError, SchemaError, SchemaModel,
    SchemaNode, load_model_set, parse_model,
};

// Compiler types
pub use ironedi_compiler::{
    ClassModel, ClassModelCompiler, ClassRegistry, CompileError, CompileOptions, CompileReport,
    CompiledType, Executor, ExecutorBuilder, InterchangeFactory, compile_from_file,
    compile_from_xml,
};
