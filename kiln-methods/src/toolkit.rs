//! The boundary between method declarations and the domain operations they run.
//!
//! A kernel library exports `create_toolkit`, returning a boxed [`Toolkit`].
//! Workers only ever call through this trait, so tests and dry runs can swap
//! in anything that implements it.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;

/// Package format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageVersion {
    pub number: i64,
    pub compress_resource_data: bool,
}

/// Sexy texture format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureVersion {
    pub number: i64,
}

/// Symbol a kernel library exports to hand out its toolkit.
pub type CreateToolkitFn = fn() -> Box<dyn Toolkit>;

/// Domain operations implemented by a kernel.
pub trait Toolkit: Send + Sync {
    /// Name reported in logs
    fn name(&self) -> &str;

    /// Pack a bundle's definition and resources into a package, staging
    /// through `buffer`.
    fn pack_package(
        &self,
        data_file: &Path,
        definition_file: &Path,
        resource_directory: &Path,
        version: PackageVersion,
        buffer: &mut [u8],
    ) -> Result<()>;

    fn unpack_package(
        &self,
        data_file: &Path,
        definition_file: &Path,
        resource_directory: &Path,
        version: PackageVersion,
    ) -> Result<()>;

    /// Pack a plain resource directory, generating the definition on the fly.
    fn pack_package_automatic(
        &self,
        resource_directory: &Path,
        data_file: &Path,
        version: PackageVersion,
    ) -> Result<()>;

    fn encrypt_xor(&self, plain_file: &Path, cipher_file: &Path, key: &[u8]) -> Result<()>;

    fn encode_sexy_texture(
        &self,
        image_file: &Path,
        data_file: &Path,
        format: &str,
        compress_texture_data: bool,
        version: TextureVersion,
    ) -> Result<()>;

    fn decode_sexy_texture(
        &self,
        data_file: &Path,
        image_file: &Path,
        version: TextureVersion,
    ) -> Result<()>;

    fn encode_texture(&self, image_file: &Path, data_file: &Path, format: &str) -> Result<()>;

    fn decode_texture(
        &self,
        data_file: &Path,
        image_file: &Path,
        size: (u32, u32),
        format: &str,
    ) -> Result<()>;
}

#[derive(Debug, Error)]
#[error("no kernel loaded, cannot {operation}")]
pub struct NoKernel {
    pub operation: &'static str,
}

/// Toolkit used when no kernel library is loaded. Every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Detached {
    fn fail(operation: &'static str) -> Result<()> {
        Err(NoKernel { operation }.into())
    }
}

impl Toolkit for Detached {
    fn name(&self) -> &str {
        "detached"
    }

    fn pack_package(&self, _: &Path, _: &Path, _: &Path, _: PackageVersion, _: &mut [u8]) -> Result<()> {
        Self::fail("pack package")
    }

    fn unpack_package(&self, _: &Path, _: &Path, _: &Path, _: PackageVersion) -> Result<()> {
        Self::fail("unpack package")
    }

    fn pack_package_automatic(&self, _: &Path, _: &Path, _: PackageVersion) -> Result<()> {
        Self::fail("pack package")
    }

    fn encrypt_xor(&self, _: &Path, _: &Path, _: &[u8]) -> Result<()> {
        Self::fail("encrypt")
    }

    fn encode_sexy_texture(&self, _: &Path, _: &Path, _: &str, _: bool, _: TextureVersion) -> Result<()> {
        Self::fail("encode sexy texture")
    }

    fn decode_sexy_texture(&self, _: &Path, _: &Path, _: TextureVersion) -> Result<()> {
        Self::fail("decode sexy texture")
    }

    fn encode_texture(&self, _: &Path, _: &Path, _: &str) -> Result<()> {
        Self::fail("encode texture")
    }

    fn decode_texture(&self, _: &Path, _: &Path, _: (u32, u32), _: &str) -> Result<()> {
        Self::fail("decode texture")
    }
}
