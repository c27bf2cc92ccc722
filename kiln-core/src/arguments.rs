//! Resolved argument sets and caller-supplied inputs.

use std::collections::HashMap;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::value::{SizeExpression, Value, ValueType};

/// Errors raised by typed access into a resolved argument set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("argument `{0}` is not resolved")]
    Missing(String),

    #[error("argument `{argument}` holds {found}, expected {expected}")]
    Kind {
        argument: String,
        expected: ValueType,
        found: ValueType,
    },
}

/// Typed values keyed by argument identifier, in declaration order.
///
/// Arguments skipped by an inapplicable condition are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

macro_rules! typed_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self, id: &str) -> Result<$ty, AccessError> {
            match self.require(id)? {
                Value::$variant(value) => Ok(value.clone()),
                other => Err(AccessError::Kind {
                    argument: id.to_string(),
                    expected: ValueType::$variant,
                    found: other.value_type(),
                }),
            }
        }
    };
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Identifiers in resolution order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub(crate) fn insert(&mut self, id: &str, value: Value) {
        match self.entries.iter_mut().find(|(key, _)| key == id) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((id.to_string(), value)),
        }
    }

    fn require(&self, id: &str) -> Result<&Value, AccessError> {
        self.get(id).ok_or_else(|| AccessError::Missing(id.to_string()))
    }

    typed_accessor!(boolean, Boolean, bool);
    typed_accessor!(integer, Integer, i64);
    typed_accessor!(floater, Floater, f64);
    typed_accessor!(size, Size, SizeExpression);
    typed_accessor!(string, String, String);
    typed_accessor!(enumeration, Enumeration, usize);

    pub fn path(&self, id: &str) -> Result<&Path, AccessError> {
        let value = self.require(id)?;
        value.as_path().ok_or_else(|| AccessError::Kind {
            argument: id.to_string(),
            expected: ValueType::Path,
            found: value.value_type(),
        })
    }
}

impl<'a> FromIterator<(&'a str, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        let mut arguments = Arguments::new();
        for (id, value) in iter {
            arguments.insert(id, value);
        }
        arguments
    }
}

impl Serialize for Arguments {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One caller-supplied input for an argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Raw text, parsed against the declared type
    Text(String),
    /// An already typed value
    Value(Value),
    /// Ask the engine to run the argument's automatic derivation
    Automatic,
}

impl Input {
    /// Text `?automatic` requests derivation; anything else is taken verbatim.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == AUTOMATIC_MARKER {
            Input::Automatic
        } else {
            Input::Text(text)
        }
    }
}

pub const AUTOMATIC_MARKER: &str = "?automatic";
pub const INPUT_MARKER: &str = "?input";

/// Caller-supplied inputs keyed by argument identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: HashMap<String, Input>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<String>, input: Input) -> &mut Self {
        self.values.insert(id.into(), input);
        self
    }

    pub fn with(mut self, id: impl Into<String>, input: Input) -> Self {
        self.set(id, input);
        self
    }

    pub fn with_text(self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.with(id, Input::Text(text.into()))
    }

    pub fn get(&self, id: &str) -> Option<&Input> {
        self.values.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn typed_access_reports_kind_mismatch() {
        let args: Arguments = [("width", Value::Integer(4))].into_iter().collect();
        assert_eq!(args.integer("width"), Ok(4));
        assert_eq!(
            args.string("width"),
            Err(AccessError::Kind {
                argument: "width".into(),
                expected: ValueType::String,
                found: ValueType::Integer,
            })
        );
        assert_eq!(args.boolean("height"), Err(AccessError::Missing("height".into())));
    }

    #[test]
    fn insertion_order_is_kept() {
        let args: Arguments = [
            ("b", Value::Path(PathBuf::from("x"))),
            ("a", Value::Boolean(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(args.ids(), vec!["b", "a"]);
        assert_eq!(args.path("b").unwrap(), Path::new("x"));
    }

    #[test]
    fn automatic_marker_is_recognized() {
        assert_eq!(Input::from_text("?automatic"), Input::Automatic);
        assert_eq!(Input::from_text("x.pak"), Input::Text("x.pak".into()));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let args: Arguments = [
            ("data_file", Value::Path(PathBuf::from("x.pak"))),
            ("version_number", Value::Integer(0)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"{"data_file":"x.pak","version_number":0}"#);
    }
}
