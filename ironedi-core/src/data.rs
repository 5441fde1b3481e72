//! Pluggable value encoders.
//!
//! Each [`DataType`] names an encoder kind with a fixed set of accepted
//! options. Encoders are built and configured once, when a codec is
//! constructed, and are then shared read-only by every encode call.

use crate::delimiters::{DelimiterType, Delimiters};
use crate::error::{Error, Result};
use crate::value::Value;
use chrono::format::{Item, StrftimeItems};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Capability implemented by value encoders.
pub trait DataEncoder: fmt::Debug + Send + Sync {
    /// Returns the encoder kind.
    fn data_type(&self) -> DataType;

    /// Applies configuration options. Called once, before any encode.
    ///
    /// # Errors
    /// Returns an error for unknown options or unusable option values.
    fn configure(&mut self, config: &EncoderConfig) -> Result<()>;

    /// Renders a value to its wire text (before escaping).
    ///
    /// # Errors
    /// Returns [`Error::ValueMismatch`] if the value kind is not supported.
    fn encode(&self, value: &Value, delimiters: &Delimiters) -> Result<String>;
}

/// Encoder kinds known to the schema vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Plain text.
    String,
    /// Signed integer.
    Integer,
    /// Decimal number honouring the decimal separator.
    Decimal,
    /// Date or date-time.
    Date,
    /// Boolean with configurable literals.
    Boolean,
}

impl DataType {
    /// Returns the canonical name of the kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::Date => "Date",
            Self::Boolean => "Boolean",
        }
    }

    /// Returns the option keys accepted by this kind.
    #[must_use]
    pub const fn options(&self) -> &'static [&'static str] {
        match self {
            Self::String => &["trim"],
            Self::Integer => &["width"],
            Self::Decimal => &["scale"],
            Self::Date => &["format"],
            Self::Boolean => &["true", "false"],
        }
    }

    /// Returns true for kinds that render numbers.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    /// Builds and configures an encoder of this kind.
    ///
    /// # Errors
    /// Returns an error if `config` holds keys outside [`Self::options`] or
    /// values the encoder cannot use.
    pub fn build(&self, config: &EncoderConfig) -> Result<Arc<dyn DataEncoder>> {
        if let Some(key) = config.keys().find(|k| !self.options().iter().any(|o| o == k)) {
            return Err(Error::UnknownOption {
                encoder: self.name(),
                key: key.to_string(),
            });
        }

        let mut encoder: Box<dyn DataEncoder> = match self {
            Self::String => Box::new(StringEncoder::default()),
            Self::Integer => Box::new(IntegerEncoder::default()),
            Self::Decimal => Box::new(DecimalEncoder::default()),
            Self::Date => Box::new(DateEncoder::default()),
            Self::Boolean => Box::new(BooleanEncoder::default()),
        };
        encoder.configure(config)?;
        Ok(Arc::from(encoder))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "String" | "string" => Ok(Self::String),
            "Integer" | "Int" | "Long" | "integer" | "int" | "long" => Ok(Self::Integer),
            "Decimal" | "BigDecimal" | "DABigDecimal" | "Double" | "decimal" => Ok(Self::Decimal),
            "Date" | "DateTime" | "date" => Ok(Self::Date),
            "Boolean" | "Bool" | "boolean" => Ok(Self::Boolean),
            _ => Err(Error::UnknownDataType {
                name: s.to_string(),
            }),
        }
    }
}

/// Key/value option set applied to an encoder at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncoderConfig(BTreeMap<String, String>);

impl EncoderConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a property list: `key=value` entries separated by `;` or
    /// newlines. Blank entries are ignored, keys and values are trimmed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPropertyList`] for an entry without `=` or with
    /// an empty key.
    pub fn parse(list: &str) -> Result<Self> {
        let mut config = Self::new();
        for entry in list.split([';', '\n']) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            match entry.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    config.insert(key.trim(), value.trim());
                }
                _ => {
                    return Err(Error::InvalidPropertyList {
                        entry: entry.to_string(),
                    });
                }
            }
        }
        Ok(config)
    }

    /// Sets an option.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Sets an option and returns the configuration (builder style).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Gets an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates option keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns true if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn parse_value<T: FromStr>(&self, encoder: &'static str, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.parse().map_err(|_| Error::InvalidOption {
                    encoder,
                    key: key.to_string(),
                    value: raw.to_string(),
                })
            })
            .transpose()
    }
}

/// Text encoder.
#[derive(Debug, Clone, Default)]
pub struct StringEncoder {
    trim: bool,
}

impl DataEncoder for StringEncoder {
    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn configure(&mut self, config: &EncoderConfig) -> Result<()> {
        if let Some(trim) = config.parse_value("String", "trim")? {
            self.trim = trim;
        }
        Ok(())
    }

    fn encode(&self, value: &Value, _delimiters: &Delimiters) -> Result<String> {
        match value {
            Value::Text(s) if self.trim => Ok(s.trim().to_string()),
            v if v.is_scalar() => Ok(v.to_string()),
            v => Err(Error::ValueMismatch {
                encoder: "String",
                found: v.kind_name(),
            }),
        }
    }
}

/// Integer encoder with optional zero padding.
#[derive(Debug, Clone, Default)]
pub struct IntegerEncoder {
    width: Option<usize>,
}

impl DataEncoder for IntegerEncoder {
    fn data_type(&self) -> DataType {
        DataType::Integer
    }

    fn configure(&mut self, config: &EncoderConfig) -> Result<()> {
        self.width = config.parse_value("Integer", "width")?;
        Ok(())
    }

    fn encode(&self, value: &Value, _delimiters: &Delimiters) -> Result<String> {
        let number = match value {
            Value::Integer(i) => *i,
            Value::Text(s) => s.trim().parse().map_err(|_| Error::ValueMismatch {
                encoder: "Integer",
                found: value.kind_name(),
            })?,
            v => {
                return Err(Error::ValueMismatch {
                    encoder: "Integer",
                    found: v.kind_name(),
                });
            }
        };

        Ok(match self.width {
            Some(width) => format!("{number:0width$}"),
            None => number.to_string(),
        })
    }
}

/// Decimal encoder; writes the delimiter table's decimal separator.
#[derive(Debug, Clone, Default)]
pub struct DecimalEncoder {
    scale: Option<u32>,
}

impl DataEncoder for DecimalEncoder {
    fn data_type(&self) -> DataType {
        DataType::Decimal
    }

    fn configure(&mut self, config: &EncoderConfig) -> Result<()> {
        self.scale = config.parse_value("Decimal", "scale")?;
        Ok(())
    }

    fn encode(&self, value: &Value, delimiters: &Delimiters) -> Result<String> {
        let mismatch = || Error::ValueMismatch {
            encoder: "Decimal",
            found: value.kind_name(),
        };
        let mut number = match value {
            Value::Decimal(d) => *d,
            Value::Integer(i) => Decimal::from(*i),
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch())?,
            _ => return Err(mismatch()),
        };
        if let Some(scale) = self.scale {
            number.rescale(scale);
        }

        let text = number.to_string();
        let separator = delimiters.get(DelimiterType::DecimalSeparator);
        if separator.is_empty() || separator == "." {
            Ok(text)
        } else {
            Ok(text.replace('.', separator))
        }
    }
}

/// Date encoder using a chrono format string.
#[derive(Debug, Clone)]
pub struct DateEncoder {
    format: String,
}

impl Default for DateEncoder {
    fn default() -> Self {
        Self {
            format: "%Y%m%d".to_string(),
        }
    }
}

impl DataEncoder for DateEncoder {
    fn data_type(&self) -> DataType {
        DataType::Date
    }

    fn configure(&mut self, config: &EncoderConfig) -> Result<()> {
        if let Some(format) = config.get("format") {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(Error::InvalidOption {
                    encoder: "Date",
                    key: "format".to_string(),
                    value: format.to_string(),
                });
            }
            self.format = format.to_string();
        }
        Ok(())
    }

    /// Text values are taken as already rendered.
    fn encode(&self, value: &Value, _delimiters: &Delimiters) -> Result<String> {
        match value {
            Value::Date(d) => Ok(d.format(&self.format).to_string()),
            Value::DateTime(dt) => Ok(dt.format(&self.format).to_string()),
            Value::Text(s) => Ok(s.clone()),
            v => Err(Error::ValueMismatch {
                encoder: "Date",
                found: v.kind_name(),
            }),
        }
    }
}

/// Boolean encoder with configurable literals.
#[derive(Debug, Clone)]
pub struct BooleanEncoder {
    true_text: String,
    false_text: String,
}

impl Default for BooleanEncoder {
    fn default() -> Self {
        Self {
            true_text: "true".to_string(),
            false_text: "false".to_string(),
        }
    }
}

impl DataEncoder for BooleanEncoder {
    fn data_type(&self) -> DataType {
        DataType::Boolean
    }

    fn configure(&mut self, config: &EncoderConfig) -> Result<()> {
        if let Some(t) = config.get("true") {
            self.true_text = t.to_string();
        }
        if let Some(f) = config.get("false") {
            self.false_text = f.to_string();
        }
        Ok(())
    }

    fn encode(&self, value: &Value, _delimiters: &Delimiters) -> Result<String> {
        match value {
            Value::Bool(true) => Ok(self.true_text.clone()),
            Value::Bool(false) => Ok(self.false_text.clone()),
            v => Err(Error::ValueMismatch {
                encoder: "Boolean",
                found: v.kind_name(),
            }),
        }
    }
}
