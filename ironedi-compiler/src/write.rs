//! Delimiter- and truncation-aware write procedures.
//!
//! Every compiled type carries a [`WriteMethod`]: the ordered steps that
//! serialize a bean of that type. Delimiters are looked up in the
//! [`Delimiters`] table handed to each call, never baked in, so the same
//! compiled type can write under any delimiter configuration.
//!
//! Layout rules:
//! - A segment with fields writes its code, then each field slot preceded
//!   by the field delimiter, then the segment terminator.
//! - A segment without fields writes only its nested segments.
//! - A composite writes its first child without a leading delimiter and
//!   every later child after its own level's delimiter.
//! - A repeating child is padded with empty slots up to its maximum
//!   occurrences so positions stay aligned.
//! - A truncatable container collects one token per child slot, drops
//!   trailing tokens without a value and writes the rest joined.

use crate::class::{Property, PropertyKind};
use ironedi_core::encoder::write_delimiter;
use ironedi_core::{Bean, DelimiterType, Delimiters, Error, Result, TokenBuffer, Value};
use std::io::Write;

/// Write procedure of a compiled type.
#[derive(Debug, Default)]
pub struct WriteMethod {
    segment_code: Option<String>,
    body: Vec<WriteStep>,
    truncate: Option<DelimiterType>,
    terminator: Option<DelimiterType>,
    flush: bool,
    segments: Vec<WriteStep>,
}

impl WriteMethod {
    /// Creates an empty write procedure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a segment code before the body (builder style).
    #[must_use]
    pub fn segment_code(mut self, code: impl Into<String>) -> Self {
        self.segment_code = Some(code.into());
        self
    }

    /// Appends a delimited child step (builder style).
    #[must_use]
    pub fn body_step(mut self, step: WriteStep) -> Self {
        self.body.push(step);
        self
    }

    /// Appends a nested segment step (builder style).
    #[must_use]
    pub fn segment_step(mut self, step: WriteStep) -> Self {
        self.segments.push(step);
        self
    }

    /// Truncates trailing empty body tokens, rejoining them at `level`.
    #[must_use]
    pub fn truncate_at(mut self, level: DelimiterType) -> Self {
        self.truncate = Some(level);
        self
    }

    /// Writes `level`'s delimiter after the body, optionally flushing.
    #[must_use]
    pub fn terminate_with(mut self, level: DelimiterType, flush: bool) -> Self {
        self.terminator = Some(level);
        self.flush = flush;
        self
    }

    /// Returns the segment code written before the body.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.segment_code.as_deref()
    }

    /// Returns true if trailing empty body tokens are dropped.
    #[must_use]
    pub fn truncates(&self) -> bool {
        self.truncate.is_some()
    }

    /// Iterates all steps: body first, then nested segments.
    pub fn steps(&self) -> impl Iterator<Item = &WriteStep> {
        self.body.iter().chain(self.segments.iter())
    }

    /// Writes `bean`.
    ///
    /// # Errors
    /// Returns an error if a property value does not fit its step, a value
    /// encoder rejects a value or the writer fails.
    pub fn write(&self, bean: &Bean, out: &mut dyn Write, delimiters: &Delimiters) -> Result<()> {
        self.write_value(bean, out, delimiters)?;
        Ok(())
    }

    /// Writes `bean` and returns true if any value or segment code was
    /// written.
    fn write_value(&self, bean: &Bean, out: &mut dyn Write, delimiters: &Delimiters) -> Result<bool> {
        let mut written = false;
        if let Some(code) = &self.segment_code {
            out.write_all(code.as_bytes())?;
            written = true;
        }

        match self.truncate {
            Some(level) => {
                let mut tokens = TokenBuffer::new();
                for step in &self.body {
                    step.collect_tokens(bean, &mut tokens, delimiters)?;
                }
                if tokens.has_value() {
                    // body steps share one level, so the first step's leading
                    // delimiter opens the joined run
                    if let Some(leading) = self.body.first().and_then(|s| s.leading) {
                        write_delimiter(out, leading, delimiters)?;
                    }
                    out.write_all(&tokens.concat_and_truncate(level, delimiters))?;
                    written = true;
                }
            }
            None => {
                for step in &self.body {
                    written |= step.write(bean, out, delimiters)?;
                }
            }
        }

        if let Some(terminator) = self.terminator {
            write_delimiter(out, terminator, delimiters)?;
            if self.flush {
                out.flush()?;
            }
        }

        for step in &self.segments {
            written |= step.write(bean, out, delimiters)?;
        }
        Ok(written)
    }
}

/// One property slot of a write procedure.
#[derive(Debug)]
pub struct WriteStep {
    property: Property,
    leading: Option<DelimiterType>,
    level: Option<DelimiterType>,
}

impl WriteStep {
    /// Creates a delimited step.
    ///
    /// `leading` is the delimiter written before the first slot (`None` for
    /// the first child of a composite); `level` separates later slots of a
    /// repeating property.
    #[must_use]
    pub fn delimited(
        property: Property,
        leading: Option<DelimiterType>,
        level: DelimiterType,
    ) -> Self {
        Self {
            property,
            leading,
            level: Some(level),
        }
    }

    /// Creates a nested segment step: no delimiters and no padding.
    #[must_use]
    pub fn segment(property: Property) -> Self {
        Self {
            property,
            leading: None,
            level: None,
        }
    }

    /// Returns the bound property.
    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// Returns the delimiter written before the first slot.
    #[must_use]
    pub fn leading(&self) -> Option<DelimiterType> {
        self.leading
    }

    /// Writes the slots of this step; returns true if any held a value.
    fn write(&self, bean: &Bean, out: &mut dyn Write, delimiters: &Delimiters) -> Result<bool> {
        let value = bean.get(&self.property.name);

        if !self.property.occurs.is_repeating() {
            if let Some(leading) = self.leading {
                write_delimiter(out, leading, delimiters)?;
            }
            return match value {
                Some(value) => self.write_item(self.single(value)?, out, delimiters),
                None => Ok(false),
            };
        }

        let items = self.items(value)?;
        let mut written = false;
        let Some(level) = self.level else {
            for item in items {
                written |= self.write_item(item, out, delimiters)?;
            }
            return Ok(written);
        };

        for slot in 0..self.slot_count(items.len()) {
            let delimiter = if slot == 0 { self.leading } else { Some(level) };
            if let Some(delimiter) = delimiter {
                write_delimiter(out, delimiter, delimiters)?;
            }
            if let Some(item) = items.get(slot) {
                written |= self.write_item(item, out, delimiters)?;
            }
        }
        Ok(written)
    }

    /// Renders each slot, without delimiters, as one token.
    fn collect_tokens(
        &self,
        bean: &Bean,
        tokens: &mut TokenBuffer,
        delimiters: &Delimiters,
    ) -> Result<()> {
        let value = bean.get(&self.property.name);

        if !self.property.occurs.is_repeating() {
            match value {
                Some(value) => self.push_token(self.single(value)?, tokens, delimiters)?,
                None => tokens.push_empty(),
            }
            return Ok(());
        }

        let items = self.items(value)?;
        for slot in 0..self.slot_count(items.len()) {
            match items.get(slot) {
                Some(item) => self.push_token(item, tokens, delimiters)?,
                None => tokens.push_empty(),
            }
        }
        Ok(())
    }

    fn push_token(&self, value: &Value, tokens: &mut TokenBuffer, delimiters: &Delimiters) -> Result<()> {
        let mut token = Vec::new();
        if self.write_item(value, &mut token, delimiters)? {
            tokens.push(token);
        } else {
            tokens.push_blank(token);
        }
        Ok(())
    }

    /// Writes one occurrence; returns true if it held a value.
    fn write_item(&self, value: &Value, out: &mut dyn Write, delimiters: &Delimiters) -> Result<bool> {
        match &self.property.kind {
            PropertyKind::Value { encoder, .. } => {
                if !value.is_scalar() {
                    return Err(self.mismatch("a scalar value", value));
                }
                let text = match encoder {
                    Some(encoder) => encoder.encode(value, delimiters)?,
                    None => value.to_string(),
                };
                out.write_all(delimiters.escape(&text).as_bytes())?;
                Ok(!text.is_empty())
            }
            PropertyKind::Bean(compiled) => {
                let bean = value
                    .as_bean()
                    .ok_or_else(|| self.mismatch("a bean", value))?;
                compiled.write_method().write_value(bean, out, delimiters)
            }
        }
    }

    fn single<'v>(&self, value: &'v Value) -> Result<&'v Value> {
        match value {
            Value::List(_) => Err(self.mismatch("a single occurrence", value)),
            other => Ok(other),
        }
    }

    /// Items of a repeating property; a single value counts as one item.
    fn items<'v>(&self, value: Option<&'v Value>) -> Result<&'v [Value]> {
        let items: &[Value] = match value {
            None => &[],
            Some(Value::List(items)) => items.as_slice(),
            Some(single) => std::slice::from_ref(single),
        };
        if let Some(max) = self.property.occurs.max {
            if items.len() > max as usize {
                return Err(Error::TooManyOccurrences {
                    property: self.property.name.clone(),
                    max,
                    found: items.len(),
                });
            }
        }
        Ok(items)
    }

    /// Number of slots written: the declared maximum, or the number of items
    /// when unbounded, and never fewer than one.
    fn slot_count(&self, items: usize) -> usize {
        let declared = self.property.occurs.max.map_or(1, |max| max as usize);
        declared.max(items).max(1)
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> Error {
        Error::PropertyMismatch {
            property: self.property.name.clone(),
            expected,
            found: found.kind_name(),
        }
    }
}
