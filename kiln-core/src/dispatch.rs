//! The dispatch root: owns the registry and the filesystem collaborator.

use std::path::Path;

use tracing::{debug, info};

use crate::arguments::{Arguments, Input, Inputs};
use crate::batch::{BatchExecutor, BatchReport, BatchRequest};
use crate::error::{Error, Result};
use crate::filesystem::{Entry, FileSystem, LocalFileSystem};
use crate::method::MethodDescriptor;
use crate::registry::Registry;
use crate::resolve::Resolver;
use crate::value::Value;

pub struct Dispatcher {
    registry: Registry,
    fs: Box<dyn FileSystem>,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self::with_filesystem(registry, LocalFileSystem)
    }

    pub fn with_filesystem(registry: Registry, fs: impl FileSystem + 'static) -> Self {
        Self {
            registry,
            fs: Box::new(fs),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Methods applicable to the entry at `path`. Empty if nothing is there.
    pub fn suggest(&self, path: &Path) -> Vec<&MethodDescriptor> {
        match self.fs.kind_of(path) {
            Some(kind) => self.registry.applicable(kind, path),
            None => Vec::new(),
        }
    }

    /// Resolve a method's arguments without running it.
    ///
    /// A `target` must satisfy the method's filter and becomes the value of
    /// its input argument, overriding any input given for it.
    pub fn resolve(
        &self,
        method_id: &str,
        target: Option<&Path>,
        inputs: &Inputs,
    ) -> Result<(&MethodDescriptor, Arguments)> {
        let method = self.registry.get(method_id)?;

        let arguments = match target {
            Some(target) => {
                let seeded = self.seed(method, target, inputs)?;
                Resolver::new(self.fs.as_ref()).resolve(method, &seeded)?
            }
            None => Resolver::new(self.fs.as_ref()).resolve(method, inputs)?,
        };
        Ok((method, arguments))
    }

    /// Resolve, then run the single-mode worker.
    pub fn invoke(
        &self,
        method_id: &str,
        target: Option<&Path>,
        inputs: &Inputs,
    ) -> Result<Arguments> {
        let (method, arguments) = self.resolve(method_id, target, inputs)?;
        info!("Invoking {}", method.id);
        (method.worker)(&arguments).map_err(|source| Error::Worker {
            method: method.id.clone(),
            source,
        })?;
        Ok(arguments)
    }

    /// Entries a batch over `root` would visit, without resolving anything.
    pub fn plan(&self, method_id: &str, root: &Path) -> Result<Vec<Entry>> {
        let method = self.registry.get(method_id)?;
        if !method.supports_batch() {
            return Err(Error::BatchUnsupported {
                method: method.id.clone(),
            });
        }
        BatchExecutor::new(self.fs.as_ref()).plan(method, root)
    }

    pub fn batch(&self, method_id: &str, request: &BatchRequest) -> Result<BatchReport> {
        let method = self.registry.get(method_id)?;
        BatchExecutor::new(self.fs.as_ref()).run(method, request)
    }

    fn seed(&self, method: &MethodDescriptor, target: &Path, inputs: &Inputs) -> Result<Inputs> {
        let accepted = self
            .fs
            .kind_of(target)
            .is_some_and(|kind| method.filter.matches(kind, target));
        if !accepted {
            return Err(Error::FilterMismatch {
                method: method.id.clone(),
                entry: target.to_path_buf(),
                kind: method.filter.kind,
                pattern: method.filter.pattern.as_str().to_string(),
            });
        }

        let input = method
            .input_argument()
            .ok_or_else(|| Error::MissingInputArgument {
                method: method.id.clone(),
            })?;
        debug!("Seeding {}.{} with {}", method.id, input.id, target.display());

        let mut seeded = inputs.clone();
        seeded.set(&input.id, Input::Value(Value::Path(target.to_path_buf())));
        Ok(seeded)
    }
}
