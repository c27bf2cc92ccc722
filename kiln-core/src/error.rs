//! Error types for the kiln dispatch engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::arguments::AccessError;
use crate::method::EntryKind;
use crate::value::{ValueError, ValueType};

/// Failure reported by a worker. Surfaced to the caller without reinterpretation.
pub type WorkerError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the kiln engine.
#[derive(Error, Debug)]
pub enum Error {
    /// An argument with the "ask input" policy received no value
    #[error("{method}: argument `{argument}`: required input missing")]
    MissingInput { method: String, argument: String },

    /// Candidate text could not be parsed into the declared type
    #[error("{method}: argument `{argument}`: malformed value `{text}`: {source}")]
    Malformed {
        method: String,
        argument: String,
        text: String,
        #[source]
        source: ValueError,
    },

    /// A typed candidate does not match the declared type
    #[error("{method}: argument `{argument}`: expected {expected}, got {found}")]
    TypeMismatch {
        method: String,
        argument: String,
        expected: ValueType,
        found: ValueType,
    },

    /// Parsed value is not a member of the declared option set
    #[error("{method}: argument `{argument}`: `{value}` is not one of [{options}]")]
    NotInOptions {
        method: String,
        argument: String,
        value: String,
        options: String,
    },

    /// The argument's checker returned a message
    #[error("{method}: argument `{argument}`: {message}")]
    Rejected {
        method: String,
        argument: String,
        message: String,
    },

    /// Automatic derivation or item mapping failed, or is unavailable
    #[error("{method}: argument `{argument}`: cannot derive value: {reason}")]
    Derivation {
        method: String,
        argument: String,
        reason: String,
    },

    /// A path argument violates its declared kind/role rule
    #[error("{method}: argument `{argument}`: `{}` {reason}", .path.display())]
    PathRule {
        method: String,
        argument: String,
        path: PathBuf,
        reason: String,
    },

    /// No method is registered under this identifier
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A method with this identifier is already registered
    #[error("Duplicate method: {0}")]
    DuplicateMethod(String),

    /// Two descriptors in one list share an identifier
    #[error("{method}: duplicate argument `{argument}`")]
    DuplicateArgument { method: String, argument: String },

    /// A batch descriptor has no single-mode counterpart
    #[error("{method}: batch argument `{argument}` has no single-mode descriptor")]
    UnknownBatchArgument { method: String, argument: String },

    /// The method has no path argument with the input role
    #[error("{method}: no input argument declared")]
    MissingInputArgument { method: String },

    /// Batch execution requested on a method without batch descriptors
    #[error("{method}: batch execution is not supported")]
    BatchUnsupported { method: String },

    /// The target entry does not satisfy the method's filter
    #[error("{method}: `{}` does not match filter ({kind} {pattern})", .entry.display())]
    FilterMismatch {
        method: String,
        entry: PathBuf,
        kind: EntryKind,
        pattern: String,
    },

    /// A batch root is missing or not a directory
    #[error("{method}: batch root `{}` is not a directory", .root.display())]
    NotADirectory { method: String, root: PathBuf },

    /// Entries under a batch root could not be listed
    #[error("{method}: cannot enumerate `{}`: {source}", .root.display())]
    Enumerate {
        method: String,
        root: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A failure while processing one batch item
    #[error("{}: {source}", .entry.display())]
    BatchItem {
        entry: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The worker reported a failure
    #[error("{method}: worker failed: {source}")]
    Worker {
        method: String,
        #[source]
        source: WorkerError,
    },

    /// Filter pattern failed to compile
    #[error("Invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type alias for kiln operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn derivation(method: &str, argument: &str, err: AccessError) -> Self {
        Error::Derivation {
            method: method.to_string(),
            argument: argument.to_string(),
            reason: err.to_string(),
        }
    }

    /// The argument this error is attributed to, if it is a resolution error.
    pub fn argument(&self) -> Option<&str> {
        match self {
            Error::MissingInput { argument, .. }
            | Error::Malformed { argument, .. }
            | Error::TypeMismatch { argument, .. }
            | Error::NotInOptions { argument, .. }
            | Error::Rejected { argument, .. }
            | Error::Derivation { argument, .. }
            | Error::PathRule { argument, .. } => Some(argument),
            Error::BatchItem { source, .. } => source.argument(),
            _ => None,
        }
    }
}
