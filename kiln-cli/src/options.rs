//! Global command-line options and the run configuration derived from them.

use std::path::PathBuf;

use clap::Args;
use kiln_core::SizeExpression;
use kiln_methods::Configuration;

/// Environment variable naming the kernel library when `--kernel` is absent.
pub const KERNEL_ENV: &str = "KILN_KERNEL";

/// Logging level for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Normal,
    Quiet,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct CliOptions {
    /// Kernel library providing the toolkit (falls back to $KILN_KERNEL)
    #[arg(long, global = true)]
    pub kernel: Option<PathBuf>,

    /// Buffer size used when packing packages (e.g. 64m)
    #[arg(long, global = true)]
    pub pack_buffer_size: Option<SizeExpression>,

    /// Enable verbose debug output
    #[arg(long, global = true, default_value_t = false, conflicts_with = "quiet")]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value_t = false)]
    pub no_color: bool,
}

/// Everything the dispatch root needs to start.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub kernel: Option<PathBuf>,
    pub log_level: LogLevel,
    pub color: bool,
    pub configuration: Configuration,
}

impl CliOptions {
    /// Convert CLI options to RunOptions, reading `KILN_KERNEL` if no kernel was given.
    pub fn into_run_options(self) -> RunOptions {
        self.into_run_options_with(std::env::var_os(KERNEL_ENV).map(PathBuf::from))
    }

    fn into_run_options_with(self, kernel_env: Option<PathBuf>) -> RunOptions {
        let log_level = if self.debug {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Quiet
        } else {
            LogLevel::Normal
        };

        let mut configuration = Configuration::default();
        if let Some(size) = self.pack_buffer_size {
            configuration.popcap_package.pack_buffer_size = size;
        }

        RunOptions {
            kernel: self.kernel.or(kernel_env),
            log_level,
            color: !self.no_color,
            configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::SizeUnit;

    #[test]
    fn kernel_flag_beats_environment() {
        let options = CliOptions {
            kernel: Some(PathBuf::from("flag.so")),
            ..CliOptions::default()
        };
        let run = options.into_run_options_with(Some(PathBuf::from("env.so")));
        assert_eq!(run.kernel, Some(PathBuf::from("flag.so")));

        let run = CliOptions::default().into_run_options_with(Some(PathBuf::from("env.so")));
        assert_eq!(run.kernel, Some(PathBuf::from("env.so")));
        assert_eq!(run.log_level, LogLevel::Normal);
    }

    #[test]
    fn pack_buffer_size_overrides_default() {
        let options = CliOptions {
            pack_buffer_size: Some(SizeExpression::new(2.0, SizeUnit::K)),
            quiet: true,
            ..CliOptions::default()
        };
        let run = options.into_run_options_with(None);
        assert_eq!(
            run.configuration.popcap_package.pack_buffer_size.bytes(),
            Some(2048)
        );
        assert_eq!(run.log_level, LogLevel::Quiet);
    }
}
