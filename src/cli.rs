//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use crate::commands;

/// buildplan - Resolve module and target descriptors into build plans
#[derive(Parser, Debug)]
#[command(name = "buildplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the build plan of one or more targets
    Resolve(commands::resolve::ResolveArgs),

    /// Check that every target resolves
    Validate(commands::validate::ValidateArgs),

    /// Display the module dependency tree of a target
    Tree(commands::tree::TreeArgs),

    /// List targets and modules
    Ls(commands::ls::LsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Ls(args) => commands::ls::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Logs go to stderr so plans on stdout stay machine-readable.
fn init_logging(level: &str) {
    // A logger may already be installed when running under a test harness
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}
