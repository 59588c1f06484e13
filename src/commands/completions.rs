//! # Completions Command Implementation
//!
//! `buildplan completions <SHELL>` prints a tab-completion script covering
//! every subcommand and flag, including the `--set KEY=VALUE` and
//! `--format` options of `resolve`. The script is generated from the clap
//! definition in [`crate::cli`], so it never drifts from the real CLI.
//!
//! With `--output`, the script is written to a file instead of stdout:
//!
//! ```bash
//! buildplan completions bash --output ~/.local/share/bash-completion/completions/buildplan
//! buildplan completions zsh > ~/.zfunc/_buildplan
//! ```
//!
//! No descriptor file is read.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use log::debug;

use crate::cli::Cli;

const BIN_NAME: &str = "buildplan";

/// Print a shell completion script
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to complete for: bash, zsh, fish, powershell or elvish
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Renders the completion script for `shell` into `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    generate(shell, &mut Cli::command(), BIN_NAME, out);
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_completions(args.shell, &mut out);
            out.flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {} completions to {}", args.shell, path.display());
        }
        None => write_completions(args.shell, &mut io::stdout().lock()),
    }
    Ok(())
}
