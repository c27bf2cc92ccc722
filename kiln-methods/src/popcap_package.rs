//! `popcap.package`: pack, unpack, automatic pack and encryption of PopCap packages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_core::prelude::*;
use kiln_core::{identity_item, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::path::suffix_mapping;
use crate::toolkit::{PackageVersion, Toolkit};

/// Package version numbers the kernel understands.
pub const VERSION_NUMBERS: &[i64] = &[0];

/// Key used by `encrypt`.
pub const XOR_KEY: &[u8] = &[0xF7];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub version_number: i64,
    pub version_compress_resource_data: bool,
    pub pack_buffer_size: SizeExpression,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version_number: 0,
            version_compress_resource_data: false,
            pack_buffer_size: SizeExpression::new(64.0, SizeUnit::M),
        }
    }
}

suffix_mapping!(data_file_of_bundle, data_file_of_bundle_item, "bundle_directory", ".pak.bundle" => ".pak");
suffix_mapping!(bundle_of_data_file, bundle_of_data_file_item, "data_file", ".pak" => ".pak.bundle");
suffix_mapping!(data_file_of_resources, "resource_directory", "" => ".pak");
suffix_mapping!(cipher_of_plain_file, cipher_of_plain_file_item, "plain_file", ".pak" => ".cipher.pak");

pub fn methods(
    toolkit: Arc<dyn Toolkit>,
    configuration: &Configuration,
) -> Result<Vec<MethodDescriptor>> {
    Ok(vec![
        pack(toolkit.clone(), configuration)?,
        unpack(toolkit.clone(), configuration)?,
        pack_automatic(toolkit.clone(), configuration)?,
        encrypt(toolkit)?,
    ])
}

fn version_arguments(configuration: &Configuration) -> [ArgumentDescriptor; 2] {
    [
        ArgumentDescriptor::integer("version_number")
            .options(VERSION_NUMBERS.iter().copied().map(Value::Integer))
            .default_value(configuration.version_number),
        ArgumentDescriptor::boolean("version_compress_resource_data")
            .default_value(configuration.version_compress_resource_data),
    ]
}

fn version(args: &Arguments) -> std::result::Result<PackageVersion, AccessError> {
    Ok(PackageVersion {
        number: args.integer("version_number")?,
        compress_resource_data: args.boolean("version_compress_resource_data")?,
    })
}

/// Definition file and resource directory inside a bundle.
fn bundle_layout(bundle_directory: &Path) -> (PathBuf, PathBuf) {
    (
        bundle_directory.join("definition.json"),
        bundle_directory.join("resource"),
    )
}

/// Largest buffer a worker may allocate.
const MAX_BUFFER_BYTES: u64 = isize::MAX as u64;

fn allocatable_size(_: &Arguments, value: &Value) -> Option<String> {
    match value {
        Value::Size(size) if size.bytes().is_some_and(|bytes| bytes <= MAX_BUFFER_BYTES) => None,
        _ => Some("buffer size is too large".to_string()),
    }
}

fn buffer_size(args: &Arguments) -> std::result::Result<usize, WorkerError> {
    let size = args.size("buffer_size")?;
    let bytes = size
        .bytes()
        .filter(|bytes| *bytes <= MAX_BUFFER_BYTES)
        .ok_or_else(|| format!("buffer size {} is too large", size))?;
    Ok(usize::try_from(bytes)?)
}

fn run_pack(
    toolkit: &dyn Toolkit,
    args: &Arguments,
    buffer: &mut [u8],
) -> std::result::Result<(), WorkerError> {
    let bundle_directory = args.path("bundle_directory")?;
    let data_file = args.path("data_file")?;
    let (definition_file, resource_directory) = bundle_layout(bundle_directory);
    debug!(
        "Packing {} into {} with {}",
        bundle_directory.display(),
        data_file.display(),
        toolkit.name()
    );
    toolkit.pack_package(
        data_file,
        &definition_file,
        &resource_directory,
        version(args)?,
        buffer,
    )?;
    Ok(())
}

fn pack(toolkit: Arc<dyn Toolkit>, configuration: &Configuration) -> Result<MethodDescriptor> {
    let mut arguments = vec![
        ArgumentDescriptor::path("bundle_directory", PathRule::input(EntryKind::Directory)),
        ArgumentDescriptor::path("data_file", PathRule::output(EntryKind::File))
            .automatic(data_file_of_bundle)
            .ask_automatic(),
    ];
    arguments.extend(version_arguments(configuration));
    arguments.push(
        ArgumentDescriptor::size("buffer_size")
            .default_value(configuration.pack_buffer_size)
            .checker(allocatable_size),
    );

    let single = toolkit.clone();
    Ok(MethodDescriptor::new(
        "pack",
        Filter::directory(r"(?i)\.pak\.bundle$")?,
        arguments,
        move |args| {
            let mut buffer = vec![0; buffer_size(args)?];
            run_pack(single.as_ref(), args, &mut buffer)
        },
    )
    .batch_worker(
        vec![
            BatchArgumentDescriptor::input("bundle_directory", identity_item),
            BatchArgumentDescriptor::output("data_file", data_file_of_bundle_item),
        ],
        move |args, context| {
            let buffer = context.buffer(buffer_size(args)?);
            run_pack(toolkit.as_ref(), args, buffer)
        },
    ))
}

fn unpack(toolkit: Arc<dyn Toolkit>, configuration: &Configuration) -> Result<MethodDescriptor> {
    let mut arguments = vec![
        ArgumentDescriptor::path("data_file", PathRule::input(EntryKind::File)),
        ArgumentDescriptor::path("bundle_directory", PathRule::output(EntryKind::Directory))
            .automatic(bundle_of_data_file)
            .ask_automatic(),
    ];
    arguments.extend(version_arguments(configuration));

    Ok(MethodDescriptor::new(
        "unpack",
        Filter::file(r"(?i)\.pak$")?,
        arguments,
        move |args| {
            let data_file = args.path("data_file")?;
            let bundle_directory = args.path("bundle_directory")?;
            let (definition_file, resource_directory) = bundle_layout(bundle_directory);
            debug!("Unpacking {} into {}", data_file.display(), bundle_directory.display());
            toolkit.unpack_package(data_file, &definition_file, &resource_directory, version(args)?)?;
            Ok(())
        },
    )
    .batch_arguments(vec![
        BatchArgumentDescriptor::input("data_file", identity_item),
        BatchArgumentDescriptor::output("bundle_directory", bundle_of_data_file_item),
    ]))
}

fn pack_automatic(
    toolkit: Arc<dyn Toolkit>,
    configuration: &Configuration,
) -> Result<MethodDescriptor> {
    let mut arguments = vec![
        ArgumentDescriptor::path("resource_directory", PathRule::input(EntryKind::Directory)),
        ArgumentDescriptor::path("data_file", PathRule::output(EntryKind::File))
            .automatic(data_file_of_resources)
            .ask_automatic(),
    ];
    arguments.extend(version_arguments(configuration));

    Ok(MethodDescriptor::new(
        "pack_automatic",
        Filter::directory("")?,
        arguments,
        move |args| {
            let resource_directory = args.path("resource_directory")?;
            let data_file = args.path("data_file")?;
            debug!("Packing {} into {}", resource_directory.display(), data_file.display());
            toolkit.pack_package_automatic(resource_directory, data_file, version(args)?)?;
            Ok(())
        },
    ))
}

fn encrypt(toolkit: Arc<dyn Toolkit>) -> Result<MethodDescriptor> {
    Ok(MethodDescriptor::new(
        "encrypt",
        Filter::file(r"(?i)\.pak$")?,
        vec![
            ArgumentDescriptor::path("plain_file", PathRule::input(EntryKind::File)),
            ArgumentDescriptor::path("cipher_file", PathRule::output(EntryKind::File))
                .automatic(cipher_of_plain_file)
                .ask_automatic(),
        ],
        move |args| {
            let plain_file = args.path("plain_file")?;
            let cipher_file = args.path("cipher_file")?;
            debug!("Encrypting {} into {}", plain_file.display(), cipher_file.display());
            toolkit.encrypt_xor(plain_file, cipher_file, XOR_KEY)?;
            Ok(())
        },
    )
    .batch_arguments(vec![
        BatchArgumentDescriptor::input("plain_file", identity_item),
        BatchArgumentDescriptor::output("cipher_file", cipher_of_plain_file_item),
    ]))
}
