//! The method groups kiln ships with.
//!
//! Each group module exposes its `Configuration` and a `methods` constructor.
//! [`register_all`] installs every group into a registry under its dotted name.

use std::sync::Arc;

use kiln_core::RegistryBuilder;
use serde::{Deserialize, Serialize};

mod path;
pub mod popcap_package;
pub mod popcap_sexy_texture;
pub mod texture_encoding;
pub mod toolkit;

pub use path::replace_suffix;
pub use toolkit::{CreateToolkitFn, Detached, NoKernel, PackageVersion, TextureVersion, Toolkit};

/// Per-group configuration. Supplies the literal defaults of the declared arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub popcap_package: popcap_package::Configuration,
    pub popcap_sexy_texture: popcap_sexy_texture::Configuration,
    pub texture_encoding: texture_encoding::Configuration,
}

pub fn register_all(
    builder: &mut RegistryBuilder,
    toolkit: Arc<dyn Toolkit>,
    configuration: &Configuration,
) -> kiln_core::Result<()> {
    builder
        .group(
            "popcap.package",
            popcap_package::methods(toolkit.clone(), &configuration.popcap_package)?,
        )?
        .group(
            "popcap.sexy_texture",
            popcap_sexy_texture::methods(toolkit.clone(), &configuration.popcap_sexy_texture)?,
        )?
        .group(
            "texture.encoding",
            texture_encoding::methods(toolkit, &configuration.texture_encoding)?,
        )?;
    Ok(())
}
