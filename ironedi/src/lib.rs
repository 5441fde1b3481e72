//! # IronEDI
//!
//! Flat-file EDI schema compiler and delimiter-aware encoder for Rust.
//!
//! IronEDI reads EDI message schemas (UN/EDIFACT, X12 and similar
//! delimiter-based formats), compiles them into in-memory codecs and writes
//! populated beans as delimited text.
//!
//! ## Features
//!
//! - **Schema model sets** - XML schema documents with imports, or TOML manifests
//! - **Shared definitions** - segments defined once and bound to the same compiled type
//! - **Delimiter-aware encoding** - truncation, occurrence padding and escaping
//! - **Interchange assembly** - UN/EDIFACT and X12 message lookups
//!
//! ## Quick Start
//!
//! ```ignore
//! use ironedi::prelude::*;
//!
//! let model = compile_from_xml(SCHEMA, "com.acme.parties")?;
//! let bean = Bean::new().with(
//!     "name_and_address",
//!     Bean::new().with("mandatory", "MANDATORY").with("optional1", "OPTIONAL1"),
//! );
//! assert_eq!(model.encode_to_string(&bean)?, "NAD+MANDATORY+OPTIONAL1'");
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Delimiters, values, value encoders and the encoder trait
//! - [`schema`] - Schema documents, model sets and validation
//! - [`compiler`] - Compiled types, artifacts and the compilation executor
//! - [`config`] - `ironedi.toml` configuration

pub mod config;
pub mod prelude;

/// Core types and traits for delimiter-based encoding.
pub mod core {
    pub use ironedi_core::*;
}

/// Schema parsing, loading and validation.
pub mod schema {
    pub use ironedi_schema::*;
}

/// Schema compilation.
pub mod compiler {
    pub use ironedi_compiler::*;
}

// Re-export commonly used items at the crate root
pub use ironedi_core::{Bean, DelimiterType, Delimiters, EdiEncoder, Value};

pub use ironedi_compiler::{
    ClassModel, CompileError, CompileReport, Executor, ExecutorBuilder, compile_from_file,
    compile_from_xml,
};

pub use config::{Config, ConfigError, Mapping};
