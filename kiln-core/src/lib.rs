mod error;
mod registry;
mod resolve;
pub mod argument;
pub mod arguments;
pub mod batch;
pub mod context;
pub mod dispatch;
pub mod filesystem;
pub mod method;
pub mod value;

pub use argument::{
    identity_item, ArgumentDescriptor, BatchArgumentDescriptor, DefaultPolicy, PathRole, PathRule,
};
pub use arguments::{AccessError, Arguments, Input, Inputs, AUTOMATIC_MARKER, INPUT_MARKER};
pub use batch::{BatchExecutor, BatchOutcome, BatchReport, BatchRequest};
pub use context::{BatchContext, SharedBuffer};
pub use dispatch::Dispatcher;
pub use error::{Error, Result, WorkerError};
pub use filesystem::{Entry, FileSystem, LocalFileSystem};
pub use method::{EntryKind, Filter, MethodDescriptor};
pub use registry::{Registry, RegistryBuilder};
pub use resolve::{BatchItem, Resolver};
pub use value::{SizeExpression, SizeUnit, Value, ValueError, ValueType};

/// Prelude module for declaring methods
pub mod prelude {
    pub use crate::{
        AccessError,
        ArgumentDescriptor,
        Arguments,
        BatchArgumentDescriptor,
        BatchContext,
        EntryKind,
        Filter,
        MethodDescriptor,
        PathRule,
        SizeExpression,
        SizeUnit,
        Value,
        WorkerError,
    };
}
