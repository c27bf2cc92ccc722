//! `texture.encoding`: raw texture data to and from PNG images.

use std::sync::Arc;

use kiln_core::prelude::*;
use kiln_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::path::suffix_mapping;
use crate::toolkit::Toolkit;

/// Composite pixel formats accepted by the texture codec.
pub const FORMATS: &[&str] = &[
    "a_8",
    "l_8",
    "la_44",
    "la_88",
    "rgb_565",
    "rgba_4444",
    "rgba_5551",
    "argb_4444",
    "argb_1555",
    "rgb_888",
    "rgba_8888",
    "argb_8888",
];

/// Nothing is configurable yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {}

suffix_mapping!(data_file_of_image, "image_file", ".png" => ".bin");
suffix_mapping!(image_of_data_file, "data_file", ".bin" => ".png");

pub fn methods(
    toolkit: Arc<dyn Toolkit>,
    _configuration: &Configuration,
) -> Result<Vec<MethodDescriptor>> {
    Ok(vec![encode(toolkit.clone())?, decode(toolkit)?])
}

fn format() -> ArgumentDescriptor {
    ArgumentDescriptor::string("format").options(FORMATS.iter().copied().map(Value::from))
}

fn positive_size(_: &Arguments, value: &Value) -> Option<String> {
    match value {
        Value::Integer(size) if *size <= 0 => Some("size must be greater than zero".to_string()),
        Value::Integer(size) if u32::try_from(*size).is_err() => {
            Some(format!("size must not exceed {}", u32::MAX))
        }
        Value::Integer(_) => None,
        _ => Some("size must be an integer".to_string()),
    }
}

fn dimension(args: &Arguments, id: &str) -> std::result::Result<u32, WorkerError> {
    Ok(u32::try_from(args.integer(id)?)?)
}

fn encode(toolkit: Arc<dyn Toolkit>) -> Result<MethodDescriptor> {
    Ok(MethodDescriptor::new(
        "encode",
        Filter::file(r"(?i)\.png$")?,
        vec![
            ArgumentDescriptor::path("image_file", PathRule::input(EntryKind::File)),
            ArgumentDescriptor::path("data_file", PathRule::output(EntryKind::File))
                .automatic(data_file_of_image)
                .ask_automatic(),
            format(),
        ],
        move |args| {
            let image_file = args.path("image_file")?;
            let data_file = args.path("data_file")?;
            let format = args.string("format")?;
            debug!("Encoding {} as {}", image_file.display(), format);
            toolkit.encode_texture(image_file, data_file, &format)?;
            Ok(())
        },
    ))
}

fn decode(toolkit: Arc<dyn Toolkit>) -> Result<MethodDescriptor> {
    Ok(MethodDescriptor::new(
        "decode",
        Filter::file(r"(?i)\.bin$")?,
        vec![
            ArgumentDescriptor::path("data_file", PathRule::input(EntryKind::File)),
            ArgumentDescriptor::path("image_file", PathRule::output(EntryKind::File))
                .automatic(image_of_data_file)
                .ask_automatic(),
            format(),
            ArgumentDescriptor::integer("image_width").checker(positive_size),
            ArgumentDescriptor::integer("image_height").checker(positive_size),
        ],
        move |args| {
            let data_file = args.path("data_file")?;
            let image_file = args.path("image_file")?;
            let format = args.string("format")?;
            let size = (dimension(args, "image_width")?, dimension(args, "image_height")?);
            debug!("Decoding {} ({}x{} {})", data_file.display(), size.0, size.1, format);
            toolkit.decode_texture(data_file, image_file, size, &format)?;
            Ok(())
        },
    ))
}
