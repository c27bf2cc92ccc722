//! Declarations of a method's named, typed, validated arguments.
//!
//! Every function attached to a descriptor is a plain `fn` pointer that sees
//! only the siblings resolved before it. Nothing outside the declaration can
//! be captured, so resolution order alone determines what a function observes.

use std::fmt;
use std::path::Path;

use crate::arguments::{AccessError, Arguments, AUTOMATIC_MARKER, INPUT_MARKER};
use crate::method::EntryKind;
use crate::value::{Value, ValueType};

/// Derives a value from the previously resolved siblings.
pub type Automatic = fn(&Arguments) -> Result<Value, AccessError>;

/// Decides whether the argument applies at all.
pub type Condition = fn(&Arguments) -> bool;

/// Returns a human-readable message when the candidate is rejected.
pub type Checker = fn(&Arguments, &Value) -> Option<String>;

/// Derives a per-item value from the siblings and the matched entry path.
pub type ItemMapper = fn(&Arguments, &Path) -> Result<Value, AccessError>;

/// What the engine does when the caller supplies nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultPolicy {
    /// Use this value verbatim
    Value(Value),
    /// The caller must supply a value
    AskInput,
    /// Run the automatic derivation function
    AskAutomatic,
}

/// Whether a path argument is read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Input,
    Output,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRole::Input => f.write_str("input"),
            PathRole::Output => f.write_str("output"),
        }
    }
}

/// Kind and role constraint on a path argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRule {
    pub kind: EntryKind,
    pub role: PathRole,
}

impl PathRule {
    pub fn input(kind: EntryKind) -> Self {
        Self { kind, role: PathRole::Input }
    }

    pub fn output(kind: EntryKind) -> Self {
        Self { kind, role: PathRole::Output }
    }
}

/// Declaration of one named argument.
#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    pub id: String,
    pub value_type: ValueType,
    pub rule: Option<PathRule>,
    pub options: Option<Vec<Value>>,
    pub checker: Option<Checker>,
    pub automatic: Option<Automatic>,
    pub condition: Option<Condition>,
    pub default: DefaultPolicy,
}

impl ArgumentDescriptor {
    pub fn new(id: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            value_type,
            rule: None,
            options: None,
            checker: None,
            automatic: None,
            condition: None,
            default: DefaultPolicy::AskInput,
        }
    }

    pub fn boolean(id: impl Into<String>) -> Self {
        Self::new(id, ValueType::Boolean)
    }

    pub fn integer(id: impl Into<String>) -> Self {
        Self::new(id, ValueType::Integer)
    }

    pub fn floater(id: impl Into<String>) -> Self {
        Self::new(id, ValueType::Floater)
    }

    pub fn size(id: impl Into<String>) -> Self {
        Self::new(id, ValueType::Size)
    }

    pub fn string(id: impl Into<String>) -> Self {
        Self::new(id, ValueType::String)
    }

    pub fn enumeration(id: impl Into<String>) -> Self {
        Self::new(id, ValueType::Enumeration)
    }

    pub fn path(id: impl Into<String>, rule: PathRule) -> Self {
        Self {
            rule: Some(rule),
            ..Self::new(id, ValueType::Path)
        }
    }

    pub fn options(mut self, options: impl IntoIterator<Item = Value>) -> Self {
        self.options = Some(options.into_iter().collect());
        self
    }

    pub fn checker(mut self, checker: Checker) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn automatic(mut self, automatic: Automatic) -> Self {
        self.automatic = Some(automatic);
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultPolicy::Value(value.into());
        self
    }

    pub fn ask_input(mut self) -> Self {
        self.default = DefaultPolicy::AskInput;
        self
    }

    pub fn ask_automatic(mut self) -> Self {
        self.default = DefaultPolicy::AskAutomatic;
        self
    }

    pub fn is_input(&self) -> bool {
        matches!(self.rule, Some(PathRule { role: PathRole::Input, .. }))
    }

    pub fn is_applicable(&self, resolved: &Arguments) -> bool {
        self.condition.map_or(true, |condition| condition(resolved))
    }

    /// How the default reads in help output: `?input`, `?automatic`, or the formatted literal.
    pub fn default_preview(&self) -> String {
        match &self.default {
            DefaultPolicy::Value(value) => value.format(),
            DefaultPolicy::AskInput => INPUT_MARKER.to_string(),
            DefaultPolicy::AskAutomatic => AUTOMATIC_MARKER.to_string(),
        }
    }
}

/// Batch-mode counterpart of a single-mode argument.
#[derive(Debug, Clone)]
pub struct BatchArgumentDescriptor {
    pub id: String,
    pub role: PathRole,
    pub item_mapper: ItemMapper,
}

impl BatchArgumentDescriptor {
    pub fn input(id: impl Into<String>, item_mapper: ItemMapper) -> Self {
        Self {
            id: id.into(),
            role: PathRole::Input,
            item_mapper,
        }
    }

    pub fn output(id: impl Into<String>, item_mapper: ItemMapper) -> Self {
        Self {
            id: id.into(),
            role: PathRole::Output,
            item_mapper,
        }
    }
}

/// Item mapper that passes the matched path through unchanged.
pub fn identity_item(_: &Arguments, item: &Path) -> Result<Value, AccessError> {
    Ok(Value::Path(item.to_path_buf()))
}
