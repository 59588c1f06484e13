//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `buildplan` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `buildplan` library.
//!
//! Commands that read descriptors share [`DescriptorArgs`] for the descriptor
//! location and the build context assignments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use buildplan::config::DEFAULT_CONFIG_FILENAME;
use buildplan::context::{parse_assignment, BuildContext};
use buildplan::store::DescriptorStore;

pub mod completions;
pub mod ls;
pub mod resolve;
pub mod tree;
pub mod validate;

/// Where to read descriptors from and which build context to apply.
#[derive(Args, Debug, Clone)]
pub struct DescriptorArgs {
    /// Descriptor file, or a directory searched for *.build.yaml fragments.
    ///
    /// Can also be set with the `BUILDPLAN_CONFIG` environment variable.
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "BUILDPLAN_CONFIG",
        default_value = DEFAULT_CONFIG_FILENAME
    )]
    pub config: PathBuf,

    /// Set a build context flag, e.g. `--set editor=true --set platform=Linux`.
    ///
    /// Flags not set take the default declared in the descriptors.
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

impl DescriptorArgs {
    /// Loads and validates the descriptor store.
    pub fn load(&self) -> Result<DescriptorStore> {
        if !self.config.exists() {
            return Err(buildplan::suggestions::config_not_found(&self.config));
        }
        DescriptorStore::load(&self.config)
            .with_context(|| format!("Failed to load descriptors from {}", self.config.display()))
    }

    /// Builds the build context from the `--set` assignments.
    pub fn context(&self, store: &DescriptorStore) -> Result<BuildContext> {
        let assignments = self
            .set
            .iter()
            .map(|raw| parse_assignment(raw))
            .collect::<buildplan::error::Result<Vec<_>>>()?;
        Ok(BuildContext::from_assignments(store.schema(), assignments)?)
    }
}
