//! Registry of method descriptors.
//!
//! Populated once through [`RegistryBuilder`] during initialization, then
//! frozen. The dispatch root owns the resulting [`Registry`]; there is no
//! process-wide table.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::method::{EntryKind, MethodDescriptor};

/// Collects method descriptors before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    methods: Vec<MethodDescriptor>,
    ids: HashSet<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one method under its own identifier.
    pub fn register(&mut self, method: MethodDescriptor) -> Result<&mut Self> {
        method.validate()?;
        if !self.ids.insert(method.id.clone()) {
            return Err(Error::DuplicateMethod(method.id));
        }
        debug!("Registered method {}", method.id);
        self.methods.push(method);
        Ok(self)
    }

    /// Register methods as `<group>.<id>`.
    pub fn group(
        &mut self,
        group: &str,
        methods: impl IntoIterator<Item = MethodDescriptor>,
    ) -> Result<&mut Self> {
        for method in methods {
            self.register(method.with_group(group))?;
        }
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            methods: self.methods,
        }
    }
}

/// Immutable set of registered methods, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    methods: Vec<MethodDescriptor>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, id: &str) -> Result<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|method| method.id == id)
            .ok_or_else(|| Error::MethodNotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Methods whose filter accepts an entry of `kind` at `path`.
    pub fn applicable(&self, kind: EntryKind, path: &Path) -> Vec<&MethodDescriptor> {
        self.methods
            .iter()
            .filter(|method| method.filter.matches(kind, path))
            .collect()
    }
}
