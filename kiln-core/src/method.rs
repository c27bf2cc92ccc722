//! Method descriptors and the filters that decide where a method applies.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::argument::{ArgumentDescriptor, BatchArgumentDescriptor};
use crate::arguments::Arguments;
use crate::context::BatchContext;
use crate::error::{Error, Result, WorkerError};

/// Single-mode worker; receives the fully resolved argument set.
pub type Worker = Box<dyn Fn(&Arguments) -> std::result::Result<(), WorkerError> + Send + Sync>;

/// Batch-mode worker; also receives the context shared across the whole batch.
pub type BatchWorker =
    Box<dyn Fn(&Arguments, &mut BatchContext) -> std::result::Result<(), WorkerError> + Send + Sync>;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("file"),
            EntryKind::Directory => f.write_str("directory"),
        }
    }
}

/// Entry kind plus a pattern over the full path string.
#[derive(Debug, Clone)]
pub struct Filter {
    pub kind: EntryKind,
    pub pattern: Regex,
}

impl Filter {
    pub fn new(kind: EntryKind, pattern: &str) -> Result<Self> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn file(pattern: &str) -> Result<Self> {
        Self::new(EntryKind::File, pattern)
    }

    pub fn directory(pattern: &str) -> Result<Self> {
        Self::new(EntryKind::Directory, pattern)
    }

    pub fn matches(&self, kind: EntryKind, path: &Path) -> bool {
        kind == self.kind && self.pattern.is_match(&path.to_string_lossy())
    }
}

/// Batch support: per-item descriptors plus an optional dedicated worker.
pub struct BatchSupport {
    pub arguments: Vec<BatchArgumentDescriptor>,
    pub worker: Option<BatchWorker>,
}

/// A registered operation.
pub struct MethodDescriptor {
    pub id: String,
    pub filter: Filter,
    pub arguments: Vec<ArgumentDescriptor>,
    pub worker: Worker,
    pub batch: Option<BatchSupport>,
}

impl MethodDescriptor {
    pub fn new(
        id: impl Into<String>,
        filter: Filter,
        arguments: Vec<ArgumentDescriptor>,
        worker: impl Fn(&Arguments) -> std::result::Result<(), WorkerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            filter,
            arguments,
            worker: Box::new(worker),
            batch: None,
        }
    }

    /// Allow batch execution; each item runs the single-mode worker.
    pub fn batch_arguments(mut self, arguments: Vec<BatchArgumentDescriptor>) -> Self {
        self.batch = Some(BatchSupport {
            arguments,
            worker: None,
        });
        self
    }

    /// Allow batch execution with a worker that shares a context across items.
    pub fn batch_worker(
        mut self,
        arguments: Vec<BatchArgumentDescriptor>,
        worker: impl Fn(&Arguments, &mut BatchContext) -> std::result::Result<(), WorkerError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.batch = Some(BatchSupport {
            arguments,
            worker: Some(Box::new(worker)),
        });
        self
    }

    pub fn supports_batch(&self) -> bool {
        self.batch.is_some()
    }

    pub fn find_argument(&self, id: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|argument| argument.id == id)
    }

    /// The first path argument with the input role.
    pub fn input_argument(&self) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|argument| argument.is_input())
    }

    /// Check the structural invariants of the descriptor lists.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for argument in &self.arguments {
            if !seen.insert(argument.id.as_str()) {
                return Err(Error::DuplicateArgument {
                    method: self.id.clone(),
                    argument: argument.id.clone(),
                });
            }
        }

        if let Some(batch) = &self.batch {
            let mut batch_seen = HashSet::new();
            for argument in &batch.arguments {
                if !seen.contains(argument.id.as_str()) {
                    return Err(Error::UnknownBatchArgument {
                        method: self.id.clone(),
                        argument: argument.id.clone(),
                    });
                }
                if !batch_seen.insert(argument.id.as_str()) {
                    return Err(Error::DuplicateArgument {
                        method: self.id.clone(),
                        argument: argument.id.clone(),
                    });
                }
            }
            if self.input_argument().is_none() {
                return Err(Error::MissingInputArgument {
                    method: self.id.clone(),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn with_group(mut self, group: &str) -> Self {
        self.id = format!("{}.{}", group, self.id);
        self
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("arguments", &self.arguments)
            .field("batch", &self.batch.as_ref().map(|batch| &batch.arguments))
            .finish()
    }
}
