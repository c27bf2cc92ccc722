//! Value types consumed as leaf argument types.
//!
//! Every primitive argument crosses the caller boundary as text. Each type
//! parses from and formats back to that text, and the pair round-trips for
//! every value the engine produces.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised while parsing value text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("size expression `{0}` is too short")]
    TooShort(String),

    #[error("unrecognized unit `{0}`")]
    UnrecognizedUnit(char),

    #[error("malformed number `{0}`")]
    MalformedNumber(String),

    #[error("`{0}` is not a boolean")]
    InvalidBoolean(String),

    #[error("`{0}` is not an integer")]
    InvalidInteger(String),

    #[error("`{0}` is not an enumeration index")]
    InvalidEnumeration(String),

    #[error("path is empty")]
    EmptyPath,
}

/// The closed set of argument types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer,
    Floater,
    Size,
    String,
    Path,
    Enumeration,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Floater => "floater",
            ValueType::Size => "size",
            ValueType::String => "string",
            ValueType::Path => "path",
            ValueType::Enumeration => "enumeration",
        };
        f.write_str(name)
    }
}

/// Unit of a size expression, scaled by 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeUnit {
    B,
    K,
    M,
    G,
}

impl SizeUnit {
    pub fn letter(self) -> char {
        match self {
            SizeUnit::B => 'b',
            SizeUnit::K => 'k',
            SizeUnit::M => 'm',
            SizeUnit::G => 'g',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'b' => Some(SizeUnit::B),
            'k' => Some(SizeUnit::K),
            'm' => Some(SizeUnit::M),
            'g' => Some(SizeUnit::G),
            _ => None,
        }
    }

    /// Number of bytes in one unit.
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::K => 1 << 10,
            SizeUnit::M => 1 << 20,
            SizeUnit::G => 1 << 30,
        }
    }
}

/// A magnitude with a unit, written `<value><unit-letter>` (e.g. `4.0m`, `1.5k`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeExpression {
    pub value: f64,
    pub unit: SizeUnit,
}

impl SizeExpression {
    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    /// Size in bytes, truncated toward zero. `None` if the magnitude is
    /// negative, not finite, or too large for a `u64`.
    pub fn bytes(&self) -> Option<u64> {
        let bytes = self.value * self.unit.multiplier() as f64;
        (bytes.is_finite() && bytes >= 0.0 && bytes < u64::MAX as f64).then(|| bytes as u64)
    }
}

impl FromStr for SizeExpression {
    type Err = ValueError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut chars = text.chars();
        let letter = match (chars.next_back(), chars.as_str()) {
            (Some(letter), prefix) if !prefix.is_empty() => letter,
            _ => return Err(ValueError::TooShort(text.to_string())),
        };
        let unit = SizeUnit::from_letter(letter).ok_or(ValueError::UnrecognizedUnit(letter))?;
        let magnitude = chars.as_str();
        let value = magnitude
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| ValueError::MalformedNumber(magnitude.to_string()))?;
        Ok(Self { value, unit })
    }
}

impl fmt::Display for SizeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_floater(self.value), self.unit.letter())
    }
}

impl Serialize for SizeExpression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SizeExpression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Whole numbers keep a trailing `.0` so the text always reads as a floater.
fn format_floater(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}.0", value)
    } else {
        format!("{}", value)
    }
}

/// A concrete typed value. Absence is modelled by `Option<Value>` at the use site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Floater(f64),
    Size(SizeExpression),
    String(String),
    Path(PathBuf),
    Enumeration(usize),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Floater(_) => ValueType::Floater,
            Value::Size(_) => ValueType::Size,
            Value::String(_) => ValueType::String,
            Value::Path(_) => ValueType::Path,
            Value::Enumeration(_) => ValueType::Enumeration,
        }
    }

    /// Parse caller text into a value of the given type.
    pub fn parse(value_type: ValueType, text: &str) -> Result<Value, ValueError> {
        let value = match value_type {
            ValueType::Boolean => Value::Boolean(parse_boolean(text)?),
            ValueType::Integer => Value::Integer(
                text.parse()
                    .map_err(|_| ValueError::InvalidInteger(text.to_string()))?,
            ),
            ValueType::Floater => Value::Floater(
                text.parse()
                    .map_err(|_| ValueError::MalformedNumber(text.to_string()))?,
            ),
            ValueType::Size => Value::Size(text.parse()?),
            ValueType::String => Value::String(text.to_string()),
            ValueType::Path => {
                if text.is_empty() {
                    return Err(ValueError::EmptyPath);
                }
                Value::Path(PathBuf::from(text))
            }
            ValueType::Enumeration => Value::Enumeration(
                text.parse()
                    .map_err(|_| ValueError::InvalidEnumeration(text.to_string()))?,
            ),
        };
        Ok(value)
    }

    /// Canonical text form; `Value::parse(v.value_type(), &v.format())` yields `v`.
    pub fn format(&self) -> String {
        self.to_string()
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Floater(value) => f.write_str(&format_floater(*value)),
            Value::Size(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
            Value::Path(value) => write!(f, "{}", value.display()),
            Value::Enumeration(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<SizeExpression> for Value {
    fn from(value: SizeExpression) -> Self {
        Value::Size(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Value::Path(value)
    }
}

fn parse_boolean(text: &str) -> Result<bool, ValueError> {
    match text.to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        _ => Err(ValueError::InvalidBoolean(text.to_string())),
    }
}
