use std::collections::HashMap;

use anyhow::Result;
use kiln_core::{Input, Inputs, MethodDescriptor, Value, ValueType};

/// Turns trailing `--name value`, `--name=value` and `--flag` tokens into
/// inputs for one method.
///
/// Subcommand options registered with [`ArgProcessor::command_flag`] or
/// [`ArgProcessor::command_option`] are accepted anywhere among the tokens,
/// unless the method declares an argument of the same name.
pub struct ArgProcessor<'a> {
    method: &'a MethodDescriptor,
    inputs: Inputs,
    command_flags: Vec<&'static str>,
    command_options: Vec<&'static str>,
    command: HashMap<String, String>,
}

/// Result of [`ArgProcessor::process`].
#[derive(Debug, Default)]
pub struct ProcessedArgs {
    pub inputs: Inputs,
    command: HashMap<String, String>,
}

impl ProcessedArgs {
    pub fn flag(&self, name: &str) -> bool {
        self.command
            .get(name)
            .is_some_and(|text| Value::parse(ValueType::Boolean, text) == Ok(Value::Boolean(true)))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.command.get(name).map(String::as_str)
    }
}

impl<'a> ArgProcessor<'a> {
    pub fn new(method: &'a MethodDescriptor) -> Self {
        Self {
            method,
            inputs: Inputs::new(),
            command_flags: Vec::new(),
            command_options: Vec::new(),
            command: HashMap::new(),
        }
    }

    pub fn command_flag(mut self, name: &'static str) -> Self {
        self.command_flags.push(name);
        self
    }

    pub fn command_option(mut self, name: &'static str) -> Self {
        self.command_options.push(name);
        self
    }

    pub fn is_boolean_param(&self, name: &str) -> bool {
        match self.method.find_argument(name) {
            Some(argument) => argument.value_type == ValueType::Boolean,
            None => self.command_flags.contains(&name),
        }
    }

    pub fn add_named_arg(&mut self, name: &str, value: &str) -> Result<()> {
        if self.method.find_argument(name).is_some() {
            self.inputs.set(name, Input::from_text(value));
        } else if self.command_flags.contains(&name) || self.command_options.contains(&name) {
            self.command.insert(name.to_string(), value.to_string());
        } else {
            anyhow::bail!("Unknown argument `{}` for {}", name, self.method.id);
        }
        Ok(())
    }

    pub fn process(mut self, tokens: &[String]) -> Result<ProcessedArgs> {
        let mut i = 0;
        while i < tokens.len() {
            let Some(token) = tokens[i].strip_prefix("--") else {
                anyhow::bail!("Unexpected argument: {}", tokens[i]);
            };

            if let Some((name, value)) = token.split_once('=') {
                self.add_named_arg(&normalize(name), value)?;
                i += 1;
                continue;
            }

            let name = normalize(token);
            if self.is_boolean_param(&name) {
                self.add_named_arg(&name, "true")?;
                i += 1;
            } else {
                i += 1;
                match tokens.get(i) {
                    Some(value) => {
                        self.add_named_arg(&name, value)?;
                        i += 1;
                    }
                    None => anyhow::bail!("Missing value for argument: {}", name),
                }
            }
        }

        Ok(ProcessedArgs {
            inputs: self.inputs,
            command: self.command,
        })
    }
}

/// `--image-width` and `--image_width` name the same argument.
fn normalize(name: &str) -> String {
    name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{ArgumentDescriptor, Filter};

    fn method() -> MethodDescriptor {
        MethodDescriptor::new(
            "texture.encoding.decode",
            Filter::file("").unwrap(),
            vec![
                ArgumentDescriptor::integer("image_width"),
                ArgumentDescriptor::string("format"),
                ArgumentDescriptor::boolean("compress_texture_data").default_value(false),
                ArgumentDescriptor::path("image_file", kiln_core::PathRule::output(kiln_core::EntryKind::File)),
            ],
            |_| Ok(()),
        )
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_forms() {
        let method = method();
        let inputs = ArgProcessor::new(&method)
            .process(&tokens(&[
                "--image-width",
                "128",
                "--format=rgba_8888",
                "--compress_texture_data",
                "--image-file",
                "?automatic",
            ]))
            .unwrap()
            .inputs;

        assert_eq!(inputs.get("image_width"), Some(&Input::Text("128".into())));
        assert_eq!(inputs.get("format"), Some(&Input::Text("rgba_8888".into())));
        assert_eq!(
            inputs.get("compress_texture_data"),
            Some(&Input::Text("true".into()))
        );
        assert_eq!(inputs.get("image_file"), Some(&Input::Automatic));
    }

    #[test]
    fn explicit_false_for_flag() {
        let method = method();
        let inputs = ArgProcessor::new(&method)
            .process(&tokens(&["--compress_texture_data=no"]))
            .unwrap()
            .inputs;
        let Some(Input::Text(text)) = inputs.get("compress_texture_data") else {
            panic!("flag not recorded");
        };
        assert_eq!(Value::parse(ValueType::Boolean, text).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn rejects_unknown_and_dangling() {
        let method = method();
        let err = ArgProcessor::new(&method)
            .process(&tokens(&["--height", "4"]))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown argument `height`"));

        let err = ArgProcessor::new(&method)
            .process(&tokens(&["--format"]))
            .unwrap_err();
        assert!(err.to_string().contains("Missing value"));

        let err = ArgProcessor::new(&method)
            .process(&tokens(&["positional"]))
            .unwrap_err();
        assert!(err.to_string().contains("Unexpected argument"));
    }

    #[test]
    fn command_options_may_follow_method_arguments() {
        let method = method();
        let processed = ArgProcessor::new(&method)
            .command_flag("dry_run")
            .command_option("output_root")
            .process(&tokens(&[
                "--format",
                "rgba_8888",
                "--dry-run",
                "--output-root",
                "out",
            ]))
            .unwrap();

        assert!(processed.flag("dry_run"));
        assert_eq!(processed.value("output_root"), Some("out"));
        assert_eq!(processed.inputs.get("format"), Some(&Input::Text("rgba_8888".into())));
        assert!(processed.inputs.get("dry_run").is_none());
    }

    #[test]
    fn method_argument_shadows_command_flag() {
        let method = method();
        let processed = ArgProcessor::new(&method)
            .command_flag("compress_texture_data")
            .process(&tokens(&["--compress-texture-data"]))
            .unwrap();
        assert!(!processed.flag("compress_texture_data"));
        assert_eq!(
            processed.inputs.get("compress_texture_data"),
            Some(&Input::Text("true".into()))
        );
    }

    #[test]
    fn unregistered_command_flag_is_unknown() {
        let method = method();
        let err = ArgProcessor::new(&method)
            .process(&tokens(&["--dry-run"]))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown argument `dry_run`"));
    }
}
