//! Delimiter levels and the runtime delimiter table.
//!
//! Delimiters are resolved at encode time rather than compiled into a codec,
//! so one compiled codec can serialize under different delimiter
//! configurations.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Delimiter level of a schema node.
///
/// Variants are declared coarsest first, so the derived ordering places
/// `Segment` before `DecimalSeparator`. The write engine relies on this
/// ordering when deciding which delimiters are finer than a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelimiterType {
    /// Segment terminator.
    Segment,
    /// Field (data element) separator.
    Field,
    /// Field repetition separator.
    FieldRepeat,
    /// Component separator.
    Component,
    /// Sub-component separator.
    SubComponent,
    /// Decimal separator used by numeric encoders.
    DecimalSeparator,
}

impl DelimiterType {
    /// All delimiter levels, coarsest first.
    pub const ALL: [Self; 6] = [
        Self::Segment,
        Self::Field,
        Self::FieldRepeat,
        Self::Component,
        Self::SubComponent,
        Self::DecimalSeparator,
    ];

    /// Returns the schema-document name of the level.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Field => "field",
            Self::FieldRepeat => "field-repeat",
            Self::Component => "component",
            Self::SubComponent => "sub-component",
            Self::DecimalSeparator => "decimal-separator",
        }
    }

    /// Returns true if this level is nested inside `other`.
    #[must_use]
    pub fn is_finer_than(&self, other: Self) -> bool {
        *self > other
    }

    /// Returns true if this level separates structural tokens.
    ///
    /// The decimal separator appears inside numeric values and is never
    /// escaped or used to split tokens.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        !matches!(self, Self::DecimalSeparator)
    }
}

impl fmt::Display for DelimiterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DelimiterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "segment" => Ok(Self::Segment),
            "field" => Ok(Self::Field),
            "field-repeat" | "fieldRepeat" => Ok(Self::FieldRepeat),
            "component" => Ok(Self::Component),
            "sub-component" | "subComponent" => Ok(Self::SubComponent),
            "decimal-separator" | "decimalSeparator" => Ok(Self::DecimalSeparator),
            _ => Err(Error::UnsupportedDelimiter {
                name: s.to_string(),
            }),
        }
    }
}

/// Runtime delimiter table.
///
/// Holds the separator for each [`DelimiterType`] plus an optional escape
/// (release) string. An empty separator means the level is not used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Delimiters {
    /// Segment terminator.
    pub segment: String,
    /// Field separator.
    pub field: String,
    /// Field repetition separator.
    pub field_repeat: String,
    /// Component separator.
    pub component: String,
    /// Sub-component separator.
    pub sub_component: String,
    /// Decimal separator.
    pub decimal_separator: String,
    /// Escape (release) string placed before delimiter text found in values.
    pub escape: Option<String>,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::edifact()
    }
}

impl Delimiters {
    /// Creates the UN/EDIFACT default delimiter table (`' + * : . ?`).
    #[must_use]
    pub fn edifact() -> Self {
        Self {
            segment: "'".to_string(),
            field: "+".to_string(),
            field_repeat: "*".to_string(),
            component: ":".to_string(),
            sub_component: String::new(),
            decimal_separator: ".".to_string(),
            escape: Some("?".to_string()),
        }
    }

    /// Creates a common ASC X12 delimiter table (`~ * ^ > .`), without escape.
    #[must_use]
    pub fn x12() -> Self {
        Self {
            segment: "~".to_string(),
            field: "*".to_string(),
            field_repeat: "^".to_string(),
            component: ">".to_string(),
            sub_component: String::new(),
            decimal_separator: ".".to_string(),
            escape: None,
        }
    }

    /// Returns the separator for the given level.
    #[must_use]
    pub fn get(&self, level: DelimiterType) -> &str {
        match level {
            DelimiterType::Segment => &self.segment,
            DelimiterType::Field => &self.field,
            DelimiterType::FieldRepeat => &self.field_repeat,
            DelimiterType::Component => &self.component,
            DelimiterType::SubComponent => &self.sub_component,
            DelimiterType::DecimalSeparator => &self.decimal_separator,
        }
    }

    /// Sets the separator for the given level.
    pub fn set(&mut self, level: DelimiterType, value: impl Into<String>) {
        let value = value.into();
        match level {
            DelimiterType::Segment => self.segment = value,
            DelimiterType::Field => self.field = value,
            DelimiterType::FieldRepeat => self.field_repeat = value,
            DelimiterType::Component => self.component = value,
            DelimiterType::SubComponent => self.sub_component = value,
            DelimiterType::DecimalSeparator => self.decimal_separator = value,
        }
    }

    /// Returns a copy with the given level replaced.
    #[must_use]
    pub fn with(mut self, level: DelimiterType, value: impl Into<String>) -> Self {
        self.set(level, value);
        self
    }

    /// Returns a copy with the escape string replaced.
    #[must_use]
    pub fn with_escape(mut self, escape: Option<String>) -> Self {
        self.escape = escape.filter(|e| !e.is_empty());
        self
    }

    /// Escapes delimiter text occurring in a value.
    ///
    /// Every occurrence of a structural delimiter or of the escape string
    /// itself is prefixed with the escape string. Without an escape string
    /// the text is returned untouched.
    #[must_use]
    pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let Some(escape) = self.escape.as_deref().filter(|e| !e.is_empty()) else {
            return Cow::Borrowed(text);
        };

        let mut specials: Vec<&str> = DelimiterType::ALL
            .iter()
            .filter(|level| level.is_structural())
            .map(|level| self.get(*level))
            .filter(|d| !d.is_empty())
            .collect();
        specials.push(escape);
        specials.sort_by_key(|s| std::cmp::Reverse(s.len()));

        if !specials.iter().any(|s| text.contains(s)) {
            return Cow::Borrowed(text);
        }

        let mut escaped = String::with_capacity(text.len() + 8);
        let mut rest = text;
        'outer: while !rest.is_empty() {
            for special in &specials {
                if let Some(tail) = rest.strip_prefix(special) {
                    escaped.push_str(escape);
                    escaped.push_str(special);
                    rest = tail;
                    continue 'outer;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                escaped.push(c);
            }
            rest = chars.as_str();
        }

        Cow::Owned(escaped)
    }
}
