//! Resolution of caller inputs into a typed, validated argument set.
//!
//! Descriptors resolve strictly in declaration order. Each step sees only the
//! siblings resolved before it, and the first failure aborts the whole
//! resolution so no partial set ever reaches a worker.

use std::path::Path;

use tracing::debug;

use crate::argument::{ArgumentDescriptor, BatchArgumentDescriptor, DefaultPolicy, PathRole};
use crate::arguments::{Arguments, Input, Inputs};
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::method::MethodDescriptor;
use crate::value::Value;

/// Candidate before coercion into the declared type.
enum Candidate {
    Text(String),
    Value(Value),
}

/// Per-item state for batch resolution.
pub struct BatchItem<'a> {
    pub descriptors: &'a [BatchArgumentDescriptor],
    pub entry: &'a Path,
    pub root: &'a Path,
    pub output_root: Option<&'a Path>,
}

impl BatchItem<'_> {
    fn descriptor(&self, id: &str) -> Option<&BatchArgumentDescriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.id == id)
    }

    /// Move an output value that lies under the batch root beneath the output root.
    fn rebase(&self, value: Value) -> Value {
        let (Some(output_root), Value::Path(path)) = (self.output_root, &value) else {
            return value;
        };
        match path.strip_prefix(self.root) {
            Ok(relative) => Value::Path(output_root.join(relative)),
            Err(_) => value,
        }
    }
}

/// Turns inputs into [`Arguments`] for one method.
pub struct Resolver<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> Resolver<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Resolve the single-mode argument set.
    pub fn resolve(&self, method: &MethodDescriptor, inputs: &Inputs) -> Result<Arguments> {
        self.resolve_with(method, inputs, None)
    }

    /// Resolve the argument set for one batch item. Arguments with a batch
    /// descriptor take their value from its item mapper; the rest resolve as
    /// in single mode.
    pub fn resolve_item(
        &self,
        method: &MethodDescriptor,
        inputs: &Inputs,
        item: &BatchItem<'_>,
    ) -> Result<Arguments> {
        self.resolve_with(method, inputs, Some(item))
    }

    fn resolve_with(
        &self,
        method: &MethodDescriptor,
        inputs: &Inputs,
        item: Option<&BatchItem<'_>>,
    ) -> Result<Arguments> {
        let mut resolved = Arguments::new();

        for descriptor in &method.arguments {
            if !descriptor.is_applicable(&resolved) {
                debug!("Skipping {}.{}: condition not met", method.id, descriptor.id);
                continue;
            }

            let batch = item.and_then(|item| item.descriptor(&descriptor.id).map(|d| (item, d)));
            let candidate = match batch {
                Some((item, batch)) => {
                    Candidate::Value(self.map_item(method, descriptor, batch, item, &resolved)?)
                }
                None => self.candidate(method, descriptor, inputs, &resolved)?,
            };

            let value = coerce(method, descriptor, candidate)?;
            self.check(method, descriptor, &resolved, &value)?;

            debug!("Resolved {}.{} = {}", method.id, descriptor.id, value);
            resolved.insert(&descriptor.id, value);
        }

        Ok(resolved)
    }

    fn candidate(
        &self,
        method: &MethodDescriptor,
        descriptor: &ArgumentDescriptor,
        inputs: &Inputs,
        resolved: &Arguments,
    ) -> Result<Candidate> {
        match inputs.get(&descriptor.id) {
            Some(Input::Text(text)) => Ok(Candidate::Text(text.clone())),
            Some(Input::Value(value)) => Ok(Candidate::Value(value.clone())),
            Some(Input::Automatic) => derive(method, descriptor, resolved).map(Candidate::Value),
            None => match &descriptor.default {
                DefaultPolicy::Value(value) => Ok(Candidate::Value(value.clone())),
                DefaultPolicy::AskInput => Err(Error::MissingInput {
                    method: method.id.clone(),
                    argument: descriptor.id.clone(),
                }),
                DefaultPolicy::AskAutomatic => {
                    derive(method, descriptor, resolved).map(Candidate::Value)
                }
            },
        }
    }

    fn map_item(
        &self,
        method: &MethodDescriptor,
        descriptor: &ArgumentDescriptor,
        batch: &BatchArgumentDescriptor,
        item: &BatchItem<'_>,
        resolved: &Arguments,
    ) -> Result<Value> {
        let value = (batch.item_mapper)(resolved, item.entry)
            .map_err(|err| Error::derivation(&method.id, &descriptor.id, err))?;
        Ok(match batch.role {
            PathRole::Output => item.rebase(value),
            PathRole::Input => value,
        })
    }

    /// Option membership, checker, then path rule.
    fn check(
        &self,
        method: &MethodDescriptor,
        descriptor: &ArgumentDescriptor,
        resolved: &Arguments,
        value: &Value,
    ) -> Result<()> {
        if let Some(options) = &descriptor.options {
            if !options.contains(value) {
                return Err(Error::NotInOptions {
                    method: method.id.clone(),
                    argument: descriptor.id.clone(),
                    value: value.format(),
                    options: options
                        .iter()
                        .map(Value::format)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }

        if let Some(checker) = descriptor.checker {
            if let Some(message) = checker(resolved, value) {
                return Err(Error::Rejected {
                    method: method.id.clone(),
                    argument: descriptor.id.clone(),
                    message,
                });
            }
        }

        if let (Some(rule), Value::Path(path)) = (descriptor.rule, value) {
            let found = self.fs.kind_of(path);
            let reason = match (rule.role, found) {
                (PathRole::Input, None) => Some("does not exist".to_string()),
                (PathRole::Input, Some(kind)) if kind != rule.kind => {
                    Some(format!("is a {}, expected a {}", kind, rule.kind))
                }
                (PathRole::Output, Some(kind)) if kind != rule.kind => {
                    Some(format!("already exists as a {}, expected a {}", kind, rule.kind))
                }
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(Error::PathRule {
                    method: method.id.clone(),
                    argument: descriptor.id.clone(),
                    path: path.clone(),
                    reason,
                });
            }
        }

        Ok(())
    }
}

fn derive(
    method: &MethodDescriptor,
    descriptor: &ArgumentDescriptor,
    resolved: &Arguments,
) -> Result<Value> {
    let automatic = descriptor.automatic.ok_or_else(|| Error::Derivation {
        method: method.id.clone(),
        argument: descriptor.id.clone(),
        reason: "no automatic derivation declared".to_string(),
    })?;
    automatic(resolved).map_err(|err| Error::derivation(&method.id, &descriptor.id, err))
}

fn coerce(
    method: &MethodDescriptor,
    descriptor: &ArgumentDescriptor,
    candidate: Candidate,
) -> Result<Value> {
    let text = match candidate {
        Candidate::Value(value) if value.value_type() == descriptor.value_type => {
            return Ok(value)
        }
        Candidate::Value(Value::String(text)) | Candidate::Text(text) => text,
        Candidate::Value(value) => {
            return Err(Error::TypeMismatch {
                method: method.id.clone(),
                argument: descriptor.id.clone(),
                expected: descriptor.value_type,
                found: value.value_type(),
            })
        }
    };
    Value::parse(descriptor.value_type, &text).map_err(|source| Error::Malformed {
        method: method.id.clone(),
        argument: descriptor.id.clone(),
        text,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::Entry;
    use crate::method::{EntryKind, Filter};
    use crate::value::ValueType;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Fixed set of known paths.
    struct Known(HashMap<PathBuf, EntryKind>);

    impl FileSystem for Known {
        fn kind_of(&self, path: &Path) -> Option<EntryKind> {
            self.0.get(path).copied()
        }

        fn entries(&self, _root: &Path) -> Result<Vec<Entry>> {
            Ok(Vec::new())
        }
    }

    fn method(arguments: Vec<ArgumentDescriptor>) -> MethodDescriptor {
        MethodDescriptor::new("test.method", Filter::file("").unwrap(), arguments, |_| Ok(()))
    }

    #[test]
    fn literal_default_is_used_verbatim() {
        let fs = Known(HashMap::new());
        let m = method(vec![ArgumentDescriptor::integer("version_number").default_value(0i64)]);
        let args = Resolver::new(&fs).resolve(&m, &Inputs::new()).unwrap();
        assert_eq!(args.integer("version_number"), Ok(0));
    }

    #[test]
    fn explicit_input_beats_default() {
        let fs = Known(HashMap::new());
        let m = method(vec![ArgumentDescriptor::integer("version_number").default_value(0i64)]);
        let inputs = Inputs::new().with_text("version_number", "7");
        let args = Resolver::new(&fs).resolve(&m, &inputs).unwrap();
        assert_eq!(args.integer("version_number"), Ok(7));
    }

    #[test]
    fn string_value_is_parsed_into_declared_type() {
        let fs = Known(HashMap::new());
        let m = method(vec![ArgumentDescriptor::size("buffer_size").default_value("8m")]);
        let args = Resolver::new(&fs).resolve(&m, &Inputs::new()).unwrap();
        assert_eq!(args.size("buffer_size").unwrap().bytes(), Some(8 << 20));
    }

    #[test]
    fn typed_value_of_wrong_kind_is_rejected() {
        let fs = Known(HashMap::new());
        let m = method(vec![ArgumentDescriptor::integer("n").default_value(true)]);
        let err = Resolver::new(&fs).resolve(&m, &Inputs::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { expected: ValueType::Integer, found: ValueType::Boolean, .. }
        ));
    }

    #[test]
    fn automatic_request_without_derivation_fails() {
        let fs = Known(HashMap::new());
        let m = method(vec![ArgumentDescriptor::integer("n")]);
        let inputs = Inputs::new().with("n", Input::Automatic);
        let err = Resolver::new(&fs).resolve(&m, &inputs).unwrap_err();
        assert!(matches!(err, Error::Derivation { .. }));
        assert_eq!(err.argument(), Some("n"));
    }

    #[test]
    fn input_path_must_exist_with_declared_kind() {
        let mut known = HashMap::new();
        known.insert(PathBuf::from("dir"), EntryKind::Directory);
        let fs = Known(known);
        let m = method(vec![ArgumentDescriptor::path(
            "data_file",
            crate::argument::PathRule::input(EntryKind::File),
        )]);

        let missing = Resolver::new(&fs)
            .resolve(&m, &Inputs::new().with_text("data_file", "nope"))
            .unwrap_err();
        assert!(matches!(missing, Error::PathRule { ref reason, .. } if reason == "does not exist"));

        let wrong = Resolver::new(&fs)
            .resolve(&m, &Inputs::new().with_text("data_file", "dir"))
            .unwrap_err();
        assert!(matches!(wrong, Error::PathRule { ref reason, .. } if reason.contains("directory")));
    }

    #[test]
    fn output_path_may_be_absent() {
        let fs = Known(HashMap::new());
        let m = method(vec![ArgumentDescriptor::path(
            "image_file",
            crate::argument::PathRule::output(EntryKind::File),
        )]);
        let args = Resolver::new(&fs)
            .resolve(&m, &Inputs::new().with_text("image_file", "out.png"))
            .unwrap();
        assert_eq!(args.path("image_file").unwrap(), Path::new("out.png"));
    }

    #[test]
    fn output_path_must_not_exist_as_other_kind() {
        let mut known = HashMap::new();
        known.insert(PathBuf::from("atlas.png"), EntryKind::Directory);
        known.insert(PathBuf::from("old.png"), EntryKind::File);
        let fs = Known(known);
        let m = method(vec![ArgumentDescriptor::path(
            "image_file",
            crate::argument::PathRule::output(EntryKind::File),
        )]);

        let err = Resolver::new(&fs)
            .resolve(&m, &Inputs::new().with_text("image_file", "atlas.png"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PathRule { ref argument, ref path, ref reason, .. }
                if argument == "image_file"
                    && path == Path::new("atlas.png")
                    && reason.starts_with("already exists as a directory")
        ));

        let args = Resolver::new(&fs)
            .resolve(&m, &Inputs::new().with_text("image_file", "old.png"))
            .unwrap();
        assert_eq!(args.path("image_file").unwrap(), Path::new("old.png"));
    }

    #[test]
    fn output_rebased_under_output_root() {
        let item = BatchItem {
            descriptors: &[],
            entry: Path::new("in/a/x.pak"),
            root: Path::new("in"),
            output_root: Some(Path::new("out")),
        };
        assert_eq!(
            item.rebase(Value::Path(PathBuf::from("in/a/x.pak.bundle"))),
            Value::Path(PathBuf::from("out/a/x.pak.bundle"))
        );
        assert_eq!(
            item.rebase(Value::Path(PathBuf::from("elsewhere/y"))),
            Value::Path(PathBuf::from("elsewhere/y"))
        );
    }
}
