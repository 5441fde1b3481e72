//! Encoder traits and token buffering for flat-file output.
//!
//! This module provides the [`EdiEncoder`] trait implemented by compiled
//! codec types, and [`TokenBuffer`], which collects child tokens of a
//! truncatable container so trailing empty tokens can be dropped before the
//! container is written.

use crate::delimiters::{DelimiterType, Delimiters};
use crate::error::Result;
use crate::value::Bean;
use std::io::Write;

/// Trait for types that serialize a populated bean to flat-file text.
///
/// # Example
/// ```ignore
/// let text = orders_type.encode_to_string(&orders, &Delimiters::edifact())?;
/// ```
pub trait EdiEncoder {
    /// Writes `bean` to `writer` using the given delimiter table.
    ///
    /// # Errors
    /// Returns an error if a property value does not fit its binding or the
    /// writer fails.
    fn encode(&self, bean: &Bean, writer: &mut dyn Write, delimiters: &Delimiters) -> Result<()>;

    /// Encodes `bean` into a string.
    ///
    /// # Errors
    /// Same as [`EdiEncoder::encode`].
    fn encode_to_string(&self, bean: &Bean, delimiters: &Delimiters) -> Result<String> {
        let mut buffer = Vec::new();
        self.encode(bean, &mut buffer, delimiters)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Ordered child tokens of a truncatable container.
///
/// Each token records whether it holds a value. Absence is tracked
/// explicitly, so a value spelled with delimiter characters is never
/// mistaken for an empty slot.
#[derive(Debug, Default, Clone)]
pub struct TokenBuffer {
    tokens: Vec<(Vec<u8>, bool)>,
}

impl TokenBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a token holding a value.
    pub fn push(&mut self, token: Vec<u8>) {
        self.tokens.push((token, true));
    }

    /// Appends an empty token (an absent slot).
    pub fn push_empty(&mut self) {
        self.tokens.push((Vec::new(), false));
    }

    /// Appends a rendered token with no value, such as a composite whose
    /// parts are all absent. It is written when a later token holds a value.
    pub fn push_blank(&mut self, token: Vec<u8>) {
        self.tokens.push((token, false));
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no token was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns true if any token holds a value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.tokens.iter().any(|(_, present)| *present)
    }

    /// Drops trailing tokens without a value and joins the rest with the
    /// `level` separator.
    ///
    /// Interior empty tokens are kept so positional slots stay aligned.
    #[must_use]
    pub fn concat_and_truncate(&self, level: DelimiterType, delimiters: &Delimiters) -> Vec<u8> {
        let keep = self
            .tokens
            .iter()
            .rposition(|(_, present)| *present)
            .map_or(0, |last| last + 1);

        let separator = delimiters.get(level).as_bytes();
        let mut joined = Vec::new();
        for (i, (token, _)) in self.tokens[..keep].iter().enumerate() {
            if i > 0 {
                joined.extend_from_slice(separator);
            }
            joined.extend_from_slice(token);
        }
        joined
    }
}

/// Writes the separator for `level` if it is set.
///
/// # Errors
/// Returns an error if the writer fails.
pub fn write_delimiter(
    writer: &mut dyn Write,
    level: DelimiterType,
    delimiters: &Delimiters,
) -> Result<()> {
    writer.write_all(delimiters.get(level).as_bytes())?;
    Ok(())
}
