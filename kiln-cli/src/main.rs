use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use kiln_core::{BatchRequest, Dispatcher, MethodDescriptor, Registry};
use tracing::debug;

mod args;
mod kernel;
mod options;

use args::ArgProcessor;
use kernel::Kernel;
use options::{CliOptions, LogLevel};

#[derive(Parser)]
#[command(author, version, about = "Typed method dispatch for PopCap resource files")]
struct Cli {
    #[command(flatten)]
    options: CliOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered methods, or describe one method's arguments
    Methods {
        /// Method identifier (e.g. popcap.package.pack)
        id: Option<String>,
    },

    /// List the methods applicable to a file or directory
    Suggest { path: PathBuf },

    /// Run a method on one target
    Run {
        method: String,

        /// Entry the method's input argument is set to
        target: PathBuf,

        /// Print the resolved arguments instead of running the worker
        #[arg(long)]
        dry_run: bool,

        /// Print JSON without pretty formatting
        #[arg(long)]
        raw: bool,

        /// Method arguments: --name value, --name=value or --flag.
        /// --dry-run and --raw are also accepted here
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        arguments: Vec<String>,
    },

    /// Run a method on every matching entry under a directory
    Batch {
        method: String,

        root: PathBuf,

        /// Write outputs under this directory, mirroring the layout under root
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// List the entries that would be processed
        #[arg(long)]
        dry_run: bool,

        /// Method arguments shared by every item.
        /// --dry-run and --output-root are also accepted here
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        arguments: Vec<String>,
    },
}

fn init_tracing(level: LogLevel) {
    let filter = match level {
        LogLevel::Debug => "kiln_core=debug,kiln_methods=debug,kiln_cli=debug",
        LogLevel::Normal => "kiln_core=info,kiln_methods=warn,kiln_cli=info",
        LogLevel::Quiet => "kiln_core=error,kiln_methods=error,kiln_cli=error",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = cli.options.into_run_options();
    init_tracing(options.log_level);
    if !options.color {
        colored::control::set_override(false);
    }

    // Declared before the dispatcher so the kernel outlives every worker.
    let kernel = match &options.kernel {
        Some(path) => Kernel::load(path)?,
        None => {
            debug!("No kernel configured, running detached");
            Kernel::detached()
        }
    };

    let mut builder = Registry::builder();
    kiln_methods::register_all(&mut builder, kernel.toolkit(), &options.configuration)?;
    let dispatcher = Dispatcher::new(builder.build());
    let quiet = options.log_level == LogLevel::Quiet;

    match cli.command {
        Command::Methods { id: None } => list_methods(&dispatcher),
        Command::Methods { id: Some(id) } => describe_method(dispatcher.registry().get(&id)?),
        Command::Suggest { path } => {
            let methods = dispatcher.suggest(&path);
            if methods.is_empty() {
                println!("{}", "No applicable methods".dimmed());
            }
            for method in methods {
                println!("{}", method.id);
            }
        }
        Command::Run {
            method,
            target,
            dry_run,
            raw,
            arguments,
        } => {
            let descriptor = dispatcher.registry().get(&method)?;
            let processed = ArgProcessor::new(descriptor)
                .command_flag("dry_run")
                .command_flag("raw")
                .process(&arguments)?;
            let inputs = &processed.inputs;

            if dry_run || processed.flag("dry_run") {
                let (_, resolved) = dispatcher.resolve(&method, Some(&target), inputs)?;
                let json = if raw || processed.flag("raw") {
                    serde_json::to_string(&resolved)?
                } else {
                    serde_json::to_string_pretty(&resolved)?
                };
                println!("{}", json);
            } else {
                dispatcher.invoke(&method, Some(&target), inputs)?;
                if !quiet {
                    println!("{} {}", "done".green().bold(), method);
                }
            }
        }
        Command::Batch {
            method,
            root,
            output_root,
            dry_run,
            arguments,
        } => {
            let descriptor = dispatcher.registry().get(&method)?;
            let processed = ArgProcessor::new(descriptor)
                .command_flag("dry_run")
                .command_option("output_root")
                .process(&arguments)?;

            if dry_run || processed.flag("dry_run") {
                for entry in dispatcher.plan(&method, &root)? {
                    println!("{}", entry.path.display());
                }
                return Ok(());
            }

            let output_root =
                output_root.or_else(|| processed.value("output_root").map(PathBuf::from));
            let mut request = BatchRequest::new(root).inputs(processed.inputs);
            if let Some(output_root) = output_root {
                request = request.output_root(output_root);
            }

            let report = dispatcher.batch(&method, &request)?;
            if !quiet {
                println!(
                    "{} {} ({} item{})",
                    "done".green().bold(),
                    method,
                    report.len(),
                    if report.len() == 1 { "" } else { "s" }
                );
            }
        }
    }

    Ok(())
}

fn list_methods(dispatcher: &Dispatcher) {
    println!("\n{}", "Available methods:".blue().bold());
    for method in dispatcher.registry().iter() {
        let batch = if method.supports_batch() { " [batch]" } else { "" };
        println!(
            "  {}{}  {}",
            method.id,
            batch.yellow(),
            format!("({} `{}`)", method.filter.kind, method.filter.pattern).dimmed()
        );
    }
    println!("\n{}", "Use 'kiln methods <id>' for argument details".dimmed());
}

fn describe_method(method: &MethodDescriptor) {
    println!("\n{}", method.id.blue().bold());
    println!(
        "  applies to: {} `{}`",
        method.filter.kind, method.filter.pattern
    );
    if method.supports_batch() {
        println!("  {}", "supports batch".yellow());
    }

    println!("\n{}", "Arguments:".bold());
    for argument in &method.arguments {
        let mut line = format!("  --{} <{}>", argument.id, argument.value_type);
        if let Some(rule) = argument.rule {
            line.push_str(&format!(" {} {}", rule.role, rule.kind));
        }
        println!(
            "{}  {}",
            line,
            format!("default: {}", argument.default_preview()).dimmed()
        );
        if let Some(options) = &argument.options {
            let options: Vec<String> = options.iter().map(|value| value.format()).collect();
            println!("      one of: {}", options.join(", "));
        }
    }
}
