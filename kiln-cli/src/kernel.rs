use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use kiln_methods::{CreateToolkitFn, Detached, Toolkit};
use libloading::{Library, Symbol};
use tracing::info;

/// The toolkit in use, plus the library that provides it.
///
/// Field order matters: the toolkit is dropped before its library is unloaded.
pub struct Kernel {
    toolkit: Arc<dyn Toolkit>,
    _library: Option<Library>,
}

impl Kernel {
    /// Load a kernel library exporting `create_toolkit`.
    pub fn load(path: &Path) -> Result<Self> {
        unsafe {
            let library = Library::new(path)
                .with_context(|| format!("Failed to load kernel library {}", path.display()))?;

            let toolkit: Arc<dyn Toolkit> = {
                let create_toolkit: Symbol<CreateToolkitFn> = library
                    .get(b"create_toolkit")
                    .with_context(|| format!("Kernel {} missing create_toolkit", path.display()))?;
                Arc::from(create_toolkit())
            };
            info!("Loaded kernel {} from {}", toolkit.name(), path.display());

            Ok(Self {
                toolkit,
                _library: Some(library),
            })
        }
    }

    /// No kernel: resolution works, every worker fails.
    pub fn detached() -> Self {
        Self {
            toolkit: Arc::new(Detached),
            _library: None,
        }
    }

    pub fn toolkit(&self) -> Arc<dyn Toolkit> {
        self.toolkit.clone()
    }
}
