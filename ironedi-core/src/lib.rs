//! # IronEDI Core
//!
//! Core types and traits for delimiter-based flat-file (EDI) encoding.
//!
//! This crate provides:
//! - Delimiter levels and the runtime delimiter table
//! - Instance values ([`Value`], [`Bean`]) handed to compiled codecs
//! - Pluggable scalar value encoders and their option schemas
//! - The [`EdiEncoder`] trait and token truncation helpers
//! - Error types for encoding operations

pub mod data;
pub mod delimiters;
pub mod encoder;
pub mod error;
pub mod value;

pub use data::{DataEncoder, DataType, EncoderConfig};
pub use delimiters::{DelimiterType, Delimiters};
pub use encoder::{EdiEncoder, TokenBuffer};
pub use error::{Error, Result};
pub use value::{Bean, Value};
