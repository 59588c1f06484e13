//! Phase 4: Plan Emission
//!
//! This is the final phase of a resolution. It turns the per-module plans of
//! phase 3 into the [`BuildPlan`] of one target and serializes it.
//!
//! ## Process
//!
//! 1.  **Roots**: The target's `extra_modules`, in declared order. An empty
//!     list is an `EmptyTarget` error and an inactive or unknown root is an
//!     `UnresolvedReference` owned by the target.
//!
//! 2.  **Target definitions**: `WITH_EDITOR` and `WITH_SERVER_CODE` derived
//!     from the target kind, then the target's own definitions.
//!
//! 3.  **Union**: Include paths and definitions of the root plans are merged
//!     in root order, first occurrence wins. Definitions are keyed by macro
//!     name, so a root imported by a later root keeps its `_API=DLLEXPORT`.
//!
//! 4.  **Link order**: A dependency-first traversal of the subgraph reachable
//!     from the roots. Every reachable module contributes exactly one plan.
//!
//! The phase reads only shared session data, so emitting the same target
//! twice gives byte-identical output.

use std::collections::HashSet;
use std::fmt::Write as _;

use log::{debug, warn};

use super::{ActiveSet, ActiveTarget, BuildPlan, ModuleGraph, ResolvedModulePlan};
use crate::config::TargetKind;
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::store::DescriptorStore;
use crate::suggestions;

/// Definitions every target gets from its kind.
pub fn kind_definitions(kind: TargetKind) -> [String; 2] {
    let editor = u8::from(kind == TargetKind::Editor);
    let server = u8::from(kind != TargetKind::Client);
    [
        format!("WITH_EDITOR={}", editor),
        format!("WITH_SERVER_CODE={}", server),
    ]
}

/// The macro a `NAME=VALUE` definition sets.
fn macro_name(definition: &str) -> &str {
    definition
        .split_once('=')
        .map_or(definition, |(name, _)| name)
        .trim()
}

/// Execute Phase 4: Emit the build plan of one active target
pub fn execute(
    store: &DescriptorStore,
    active: &ActiveSet<'_>,
    graph: &ModuleGraph,
    plans: &[ResolvedModulePlan],
    context: &BuildContext,
    target: &ActiveTarget<'_>,
) -> Result<BuildPlan> {
    let name = target.name();
    if target.extra_modules.is_empty() {
        return Err(Error::EmptyTarget {
            target: name.to_string(),
        });
    }

    let mut roots = Vec::with_capacity(target.extra_modules.len());
    for &module in &target.extra_modules {
        let node = active
            .position(module)
            .ok_or_else(|| Error::UnresolvedReference {
                owner: name.to_string(),
                reference: module.to_string(),
                hint: suggestions::unresolved_module(
                    module,
                    active.module_names(),
                    !store.modules_named(module).is_empty(),
                ),
            })?;
        if roots.contains(&node) {
            warn!("Target '{}' lists module '{}' more than once", name, module);
            continue;
        }
        roots.push(node);
    }

    let mut definitions: Vec<String> = Vec::new();
    let mut defined = HashSet::new();
    let target_definitions = kind_definitions(target.descriptor.kind)
        .into_iter()
        .chain(target.definitions.iter().map(|d| d.to_string()));
    for definition in target_definitions {
        if defined.insert(macro_name(&definition).to_string()) {
            definitions.push(definition);
        } else if !definitions.contains(&definition) {
            warn!(
                "Target '{}' redefines '{}'; keeping the first definition",
                name,
                macro_name(&definition)
            );
        }
    }

    let mut include_paths = Vec::new();
    let mut seen_paths = HashSet::new();
    for &root in &roots {
        let plan = &plans[root];
        for path in &plan.include_paths {
            if seen_paths.insert(path.as_str()) {
                include_paths.push(path.clone());
            }
        }
        for definition in &plan.definitions {
            if defined.insert(macro_name(definition).to_string()) {
                definitions.push(definition.clone());
            }
        }
    }

    let link = graph.dependency_first(&roots);
    let link_order: Vec<String> = link
        .iter()
        .map(|&node| active.modules[node].name().to_string())
        .collect();
    let modules: Vec<ResolvedModulePlan> = link.iter().map(|&node| plans[node].clone()).collect();

    debug!(
        "Target '{}': {} roots, {} modules to link",
        name,
        roots.len(),
        link_order.len()
    );

    Ok(BuildPlan {
        target: name.to_string(),
        kind: target.descriptor.kind,
        build_settings: target.descriptor.build_settings,
        include_order: target.descriptor.include_order,
        context: context.to_map(),
        root_modules: roots
            .iter()
            .map(|&node| active.modules[node].name().to_string())
            .collect(),
        pch: plans[roots[0]].pch,
        include_paths,
        definitions,
        link_order,
        modules,
    })
}

/// Pretty-printed JSON, the default output of `resolve`.
pub fn to_json(plan: &BuildPlan) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// YAML rendering of a plan.
pub fn to_yaml(plan: &BuildPlan) -> Result<String> {
    Ok(serde_yaml::to_string(plan)?)
}

/// Human-readable rendering of a plan.
pub fn to_text(plan: &BuildPlan) -> String {
    let mut out = String::new();
    let context: Vec<String> = plan
        .context
        .iter()
        .map(|(flag, value)| format!("{}={}", flag, value))
        .collect();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Target: {} ({:?})", plan.target, plan.kind);
    let _ = writeln!(out, "Context: {{{}}}", context.join(", "));
    let _ = writeln!(
        out,
        "Build settings: {:?}, include order: {:?}, PCH: {:?}",
        plan.build_settings, plan.include_order, plan.pch
    );
    let _ = writeln!(out, "Root modules: {}", plan.root_modules.join(", "));
    write_list(&mut out, "Include paths", &plan.include_paths, "");
    write_list(&mut out, "Definitions", &plan.definitions, "");
    write_list(&mut out, "Link order", &plan.link_order, "");

    for module in &plan.modules {
        let _ = writeln!(out);
        match &module.pch_header {
            Some(header) => {
                let _ = writeln!(out, "Module {} (PCH: {:?}, {})", module.module, module.pch, header);
            }
            None => {
                let _ = writeln!(out, "Module {} (PCH: {:?})", module.module, module.pch);
            }
        }
        write_list(&mut out, "Include paths", &module.include_paths, "  ");
        write_list(&mut out, "Definitions", &module.definitions, "  ");
        write_list(&mut out, "Links", &module.link_dependencies, "  ");
    }
    out
}

fn write_list(out: &mut String, title: &str, items: &[String], indent: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "{}{}: (none)", indent, title);
        return;
    }
    let _ = writeln!(out, "{}{}:", indent, title);
    for item in items {
        let _ = writeln!(out, "{}  {}", indent, item);
    }
}
