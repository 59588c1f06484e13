//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which prints the build
//! plan of one or more targets under a build context.
//!
//! ## Functionality
//!
//! - **Plan Emission**: Resolves each requested target against the same
//!   session, in parallel, and prints the plans in request order.
//! - **Output Formats**: Pretty JSON (default, meant for the external
//!   builder), YAML, or a human-readable text listing.
//! - **Output File**: `--output` writes the plans to a file instead of stdout.
//!
//! One target prints a single plan; several targets print a list.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use log::info;

use buildplan::phases::{emit, BuildPlan, Session};

use super::DescriptorArgs;

/// Output format of `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum PlanFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
    /// Human-readable listing
    Text,
}

/// Resolve targets into build plans
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Targets to resolve
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<String>,

    #[command(flatten)]
    pub descriptors: DescriptorArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: PlanFormat,

    /// Write the plan to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs) -> Result<()> {
    let store = args.descriptors.load()?;
    let context = args.descriptors.context(&store)?;
    let session = Session::new(&store, context)?;

    let mut plans = Vec::with_capacity(args.targets.len());
    for (target, result) in args.targets.iter().zip(session.plan_all(&args.targets)) {
        plans.push(result.with_context(|| format!("Failed to resolve target '{}'", target))?);
    }

    let rendered = render(&plans, args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            info!("Wrote {} plan(s) to {}", plans.len(), path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Renders one plan as itself and several as a list.
pub fn render(plans: &[BuildPlan], format: PlanFormat) -> Result<String> {
    let rendered = match (format, plans) {
        (PlanFormat::Json, [plan]) => emit::to_json(plan)? + "\n",
        (PlanFormat::Json, _) => serde_json::to_string_pretty(plans)? + "\n",
        (PlanFormat::Yaml, [plan]) => emit::to_yaml(plan)?,
        (PlanFormat::Yaml, _) => serde_yaml::to_string(plans)?,
        (PlanFormat::Text, _) => plans
            .iter()
            .map(emit::to_text)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(rendered)
}
