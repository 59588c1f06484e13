//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a
//! descriptor set without printing any plan.
//!
//! ## Functionality
//!
//! - **Descriptor Validation**: Parses every document and builds the store,
//!   checking names, duplicates and PCH settings.
//! - **Resolution Check**: Resolves every active target under the given
//!   context, which finds unresolved references, cycles, unknown conditionals
//!   and empty targets.
//! - **All Contexts**: With `--all-contexts`, repeats the resolution check
//!   under every combination of context flag values, so that a defect hidden
//!   behind `editor: true` or an engine era is still reported.
//!
//! This command is a safe, read-only operation.

use anyhow::Result;
use clap::Args;
use log::debug;

use buildplan::context::BuildContext;
use buildplan::error::Error;
use buildplan::output::{emoji, emphasis, OutputConfig};
use buildplan::phases::Session;
use buildplan::store::DescriptorStore;

use super::DescriptorArgs;

/// Validate a descriptor set
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub descriptors: DescriptorArgs,

    /// Check every combination of context flag values instead of one context.
    #[arg(long, conflicts_with = "set")]
    pub all_contexts: bool,
}

/// Defect found while checking one context.
#[derive(Debug)]
pub struct Finding {
    pub context: BuildContext,
    pub target: Option<String>,
    pub error: Error,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Validating descriptors: {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.descriptors.config.display()
    );

    let store = args.descriptors.load()?;
    println!(
        "{} Descriptors parsed successfully",
        emoji(&out, "✅", "[OK]")
    );
    println!("\n{} Descriptor Summary:", emoji(&out, "📊", "[INFO]"));
    println!("   Modules: {}", store.module_names().count());
    println!("   Targets: {}", store.target_names().count());
    println!("   Context flags: {}", store.schema().len());

    let contexts = if args.all_contexts {
        BuildContext::enumerate(store.schema())
    } else {
        vec![args.descriptors.context(&store)?]
    };

    println!(
        "\n{} Resolving targets under {} context(s)...",
        emoji(&out, "🔄", "[CHECK]"),
        contexts.len()
    );

    let mut findings = Vec::new();
    for context in contexts {
        let (resolved, mut found) = check_context(&store, context.clone());
        if found.is_empty() {
            println!(
                "{} {}: {} target(s) resolved",
                emoji(&out, "✅", "[OK]"),
                context,
                resolved
            );
        }
        for finding in &found {
            let subject = finding
                .target
                .as_deref()
                .map(|t| format!(" target {}", emphasis(&out, t)))
                .unwrap_or_default();
            println!(
                "{} {}{}: {}",
                emoji(&out, "❌", "[ERR]"),
                finding.context,
                subject,
                finding.error
            );
        }
        findings.append(&mut found);
    }

    if findings.is_empty() {
        println!("\n{} All descriptors are valid", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    let count = findings.len();
    let first = findings.remove(0);
    Err(anyhow::Error::new(first.error).context(format!(
        "Validation failed with {} problem(s); first under {}",
        count, first.context
    )))
}

/// Resolves every active target under one context.
///
/// Returns the number of targets resolved and the defects found.
pub fn check_context(store: &DescriptorStore, context: BuildContext) -> (usize, Vec<Finding>) {
    let session = match Session::new(store, context.clone()) {
        Ok(session) => session,
        Err(error) => {
            return (
                0,
                vec![Finding {
                    context,
                    target: None,
                    error,
                }],
            )
        }
    };

    let targets = session.target_names();
    debug!("Checking {} targets under {}", targets.len(), context);

    let mut resolved = 0;
    let mut findings = Vec::new();
    for (target, result) in targets.iter().zip(session.plan_all(&targets)) {
        match result {
            Ok(_) => resolved += 1,
            Err(error) => findings.push(Finding {
                context: context.clone(),
                target: Some(target.to_string()),
                error,
            }),
        }
    }
    (resolved, findings)
}
