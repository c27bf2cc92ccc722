//! Batch execution over every entry under a root that matches a method's filter.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::arguments::{Arguments, Input, Inputs};
use crate::context::BatchContext;
use crate::error::{Error, Result};
use crate::filesystem::{Entry, FileSystem};
use crate::method::{EntryKind, MethodDescriptor};
use crate::resolve::{BatchItem, Resolver};
use crate::value::Value;

/// Parameters of one batch invocation.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub root: PathBuf,
    /// Where rebased outputs go. `None` keeps outputs next to their inputs.
    pub output_root: Option<PathBuf>,
    /// Inputs shared by every item.
    pub inputs: Inputs,
}

impl BatchRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(output_root.into());
        self
    }

    pub fn inputs(mut self, inputs: Inputs) -> Self {
        self.inputs = inputs;
        self
    }
}

/// A processed batch item.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub entry: PathBuf,
    pub arguments: Arguments,
}

/// Items processed by a completed batch, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub items: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub struct BatchExecutor<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Entries under `root` accepted by the method's filter, in stable order.
    pub fn plan(&self, method: &MethodDescriptor, root: &Path) -> Result<Vec<Entry>> {
        if self.fs.kind_of(root) != Some(EntryKind::Directory) {
            return Err(Error::NotADirectory {
                method: method.id.clone(),
                root: root.to_path_buf(),
            });
        }

        let entries: Vec<Entry> = self
            .fs
            .entries(root)
            .map_err(|source| Error::Enumerate {
                method: method.id.clone(),
                root: root.to_path_buf(),
                source: Box::new(source),
            })?
            .into_iter()
            .filter(|entry| method.filter.matches(entry.kind, &entry.path))
            .collect();
        if entries.is_empty() {
            warn!("{}: nothing under {} matches `{}`", method.id, root.display(), method.filter.pattern);
        } else {
            debug!("{}: {} item(s) under {}", method.id, entries.len(), root.display());
        }
        Ok(entries)
    }

    /// Resolve and run every planned item, stopping at the first failure.
    ///
    /// Earlier items' side effects are left in place when a later item fails.
    pub fn run(&self, method: &MethodDescriptor, request: &BatchRequest) -> Result<BatchReport> {
        let batch = method.batch.as_ref().ok_or_else(|| Error::BatchUnsupported {
            method: method.id.clone(),
        })?;
        let input = method
            .input_argument()
            .ok_or_else(|| Error::MissingInputArgument {
                method: method.id.clone(),
            })?;

        let entries = self.plan(method, &request.root)?;
        let resolver = Resolver::new(self.fs);
        let mut context = BatchContext::new();
        let mut report = BatchReport::default();

        for entry in entries {
            info!("{}: processing {}", method.id, entry.path.display());

            let mut inputs = request.inputs.clone();
            inputs.set(&input.id, Input::Value(Value::Path(entry.path.clone())));
            let item = BatchItem {
                descriptors: &batch.arguments,
                entry: &entry.path,
                root: &request.root,
                output_root: request.output_root.as_deref(),
            };

            let outcome = resolver
                .resolve_item(method, &inputs, &item)
                .and_then(|arguments| {
                    let result = match &batch.worker {
                        Some(worker) => worker(&arguments, &mut context),
                        None => (method.worker)(&arguments),
                    };
                    result
                        .map(|()| arguments)
                        .map_err(|source| Error::Worker {
                            method: method.id.clone(),
                            source,
                        })
                });

            match outcome {
                Ok(arguments) => {
                    info!("{}: finished {}", method.id, entry.path.display());
                    report.items.push(BatchOutcome {
                        entry: entry.path,
                        arguments,
                    });
                }
                Err(source) => {
                    return Err(Error::BatchItem {
                        entry: entry.path,
                        source: Box::new(source),
                    })
                }
            }
        }

        Ok(report)
    }
}
