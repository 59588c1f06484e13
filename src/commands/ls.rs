//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists the targets and
//! modules a descriptor set declares and whether each is active under the
//! build context.
//!
//! It only runs the context filter, so it works on descriptor sets whose
//! dependency graph does not resolve yet.

use anyhow::Result;
use clap::Args;

use buildplan::output::{muted, OutputConfig};
use buildplan::phases::{phase1, ActiveSet};
use buildplan::store::DescriptorStore;

use super::DescriptorArgs;

/// List targets and modules
#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub descriptors: DescriptorArgs,

    /// Hide descriptors that are inactive under the build context.
    #[arg(long)]
    pub active: bool,

    /// List only targets.
    #[arg(long, conflicts_with = "modules")]
    pub targets: bool,

    /// List only modules.
    #[arg(long)]
    pub modules: bool,
}

/// One listed descriptor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub detail: Option<String>,
    pub active: bool,
}

/// Execute the `ls` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: LsArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let store = args.descriptors.load()?;
    let context = args.descriptors.context(&store)?;
    let active = phase1::execute(&store, &context)?;

    if !args.modules {
        println!("Targets:");
        print_entries(&out, &target_entries(&store, &active), args.active);
    }
    if !args.targets {
        if !args.modules {
            println!();
        }
        println!("Modules:");
        print_entries(&out, &module_entries(&store, &active), args.active);
    }
    Ok(())
}

fn print_entries(out: &OutputConfig, entries: &[Entry], active_only: bool) {
    for entry in entries {
        if active_only && !entry.active {
            continue;
        }
        let mut line = format!("  {}", entry.name);
        if let Some(detail) = &entry.detail {
            line.push_str(&format!(" ({})", detail));
        }
        if !entry.active {
            line = format!("{} {}", muted(out, &line), muted(out, "[inactive]"));
        }
        println!("{}", line);
    }
}

/// Targets by name, with the kind of the active variant.
pub fn target_entries(store: &DescriptorStore, active: &ActiveSet<'_>) -> Vec<Entry> {
    store
        .target_names()
        .map(|name| match active.target(name) {
            Some(target) => Entry {
                name: name.to_string(),
                detail: Some(format!("{:?}", target.descriptor.kind)),
                active: true,
            },
            None => Entry {
                name: name.to_string(),
                detail: None,
                active: false,
            },
        })
        .collect()
}

/// Modules by name, with the number of dependencies of the active variant.
pub fn module_entries(store: &DescriptorStore, active: &ActiveSet<'_>) -> Vec<Entry> {
    store
        .module_names()
        .map(|name| {
            let module = active.module(name);
            Entry {
                name: name.to_string(),
                detail: module.map(|m| {
                    format!(
                        "{} public, {} private",
                        m.public_dependencies.len(),
                        m.private_dependencies.len()
                    )
                }),
                active: module.is_some(),
            }
        })
        .collect()
}
