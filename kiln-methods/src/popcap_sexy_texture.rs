//! `popcap.sexy_texture`: conversion between PNG images and sexy texture files.

use std::sync::Arc;

use kiln_core::prelude::*;
use kiln_core::{identity_item, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::path::suffix_mapping;
use crate::toolkit::{TextureVersion, Toolkit};

pub const VERSION_NUMBERS: &[i64] = &[0];

/// Pixel formats a sexy texture may store.
pub const FORMATS: &[&str] = &[
    "argb_8888",
    "argb_4444",
    "rgb_565",
    "argb_1555",
    "argb_4444_tiled",
    "rgb_565_tiled",
    "argb_1555_tiled",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub version_number: i64,
    pub encode_compress_texture_data: bool,
}

suffix_mapping!(data_file_of_image, data_file_of_image_item, "image_file", ".png" => ".tex");
suffix_mapping!(image_of_data_file, image_of_data_file_item, "data_file", ".tex" => ".png");

pub fn methods(
    toolkit: Arc<dyn Toolkit>,
    configuration: &Configuration,
) -> Result<Vec<MethodDescriptor>> {
    Ok(vec![
        encode(toolkit.clone(), configuration)?,
        decode(toolkit, configuration)?,
    ])
}

fn version_number(configuration: &Configuration) -> ArgumentDescriptor {
    ArgumentDescriptor::integer("version_number")
        .options(VERSION_NUMBERS.iter().copied().map(Value::Integer))
        .default_value(configuration.version_number)
}

fn version(args: &Arguments) -> std::result::Result<TextureVersion, AccessError> {
    Ok(TextureVersion {
        number: args.integer("version_number")?,
    })
}

fn encode(toolkit: Arc<dyn Toolkit>, configuration: &Configuration) -> Result<MethodDescriptor> {
    Ok(MethodDescriptor::new(
        "encode",
        Filter::file(r"(?i)\.png$")?,
        vec![
            ArgumentDescriptor::path("image_file", PathRule::input(EntryKind::File)),
            ArgumentDescriptor::path("data_file", PathRule::output(EntryKind::File))
                .automatic(data_file_of_image)
                .ask_automatic(),
            version_number(configuration),
            ArgumentDescriptor::string("format").options(FORMATS.iter().copied().map(Value::from)),
            ArgumentDescriptor::boolean("compress_texture_data")
                .default_value(configuration.encode_compress_texture_data),
        ],
        move |args| {
            let image_file = args.path("image_file")?;
            let data_file = args.path("data_file")?;
            let format = args.string("format")?;
            debug!("Encoding {} as {} into {}", image_file.display(), format, data_file.display());
            toolkit.encode_sexy_texture(
                image_file,
                data_file,
                &format,
                args.boolean("compress_texture_data")?,
                version(args)?,
            )?;
            Ok(())
        },
    )
    .batch_arguments(vec![
        BatchArgumentDescriptor::input("image_file", identity_item),
        BatchArgumentDescriptor::output("data_file", data_file_of_image_item),
    ]))
}

fn decode(toolkit: Arc<dyn Toolkit>, configuration: &Configuration) -> Result<MethodDescriptor> {
    Ok(MethodDescriptor::new(
        "decode",
        Filter::file(r"(?i)\.tex$")?,
        vec![
            ArgumentDescriptor::path("data_file", PathRule::input(EntryKind::File)),
            ArgumentDescriptor::path("image_file", PathRule::output(EntryKind::File))
                .automatic(image_of_data_file)
                .ask_automatic(),
            version_number(configuration),
        ],
        move |args| {
            let data_file = args.path("data_file")?;
            let image_file = args.path("image_file")?;
            debug!("Decoding {} into {}", data_file.display(), image_file.display());
            toolkit.decode_sexy_texture(data_file, image_file, version(args)?)?;
            Ok(())
        },
    )
    .batch_arguments(vec![
        BatchArgumentDescriptor::input("data_file", identity_item),
        BatchArgumentDescriptor::output("image_file", image_of_data_file_item),
    ]))
}
