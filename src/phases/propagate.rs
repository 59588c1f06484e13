//! Phase 3: Visibility Propagation
//!
//! This phase computes a [`ResolvedModulePlan`] for every node of the graph.
//!
//! ## Rules
//!
//! - A module's **exported interface** is its public include paths and
//!   definitions, followed by the exported interfaces of its public
//!   dependencies. Private edges stop re-export.
//! - A module's compile sees its own public and private include paths and
//!   definitions, then the exported interface of each direct dependency in
//!   edge order, public and private alike.
//! - Each module compiles with `<NAME>_API=DLLEXPORT`; every module that sees
//!   its interface gets `<NAME>_API=DLLIMPORT`.
//! - A module links against everything reachable over any edge, dependencies
//!   first.
//!
//! First occurrence wins everywhere; repeats are dropped. Interfaces are
//! memoized by walking the graph in topological order, so each is computed
//! once per session.

use std::collections::HashSet;

use log::debug;

use super::{ActiveModule, ActiveSet, ModuleGraph, ResolvedModulePlan, Visibility};
use crate::config::PchPolicy;
use crate::error::Result;

/// Insertion-ordered list without repeats.
#[derive(Debug, Clone, Default)]
struct Ordered {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl Ordered {
    fn push(&mut self, item: &str) {
        if !self.seen.contains(item) {
            self.seen.insert(item.to_string());
            self.items.push(item.to_string());
        }
    }

    fn extend<'i>(&mut self, items: impl IntoIterator<Item = &'i str>) {
        for item in items {
            self.push(item);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// What dependents of a module get to see.
#[derive(Debug, Clone, Default)]
struct Interface {
    include_paths: Vec<String>,
    definitions: Vec<String>,
}

/// `<NAME>_API` macro of a module.
pub fn api_macro(module: &str) -> String {
    format!("{}_API", module.to_uppercase())
}

/// Execute Phase 3: Resolve every module of the graph
///
/// Returns one plan per node, indexed like the active set.
pub fn execute(active: &ActiveSet<'_>, graph: &ModuleGraph) -> Result<Vec<ResolvedModulePlan>> {
    let mut exported: Vec<Interface> = vec![Interface::default(); graph.len()];
    for &node in graph.topological_order() {
        exported[node] = export(&active.modules[node], graph, node, &exported);
    }

    let plans: Vec<ResolvedModulePlan> = (0..graph.len())
        .map(|node| resolve_module(active, graph, node, &exported))
        .collect();

    debug!("Resolved {} module plans", plans.len());
    Ok(plans)
}

fn export(
    module: &ActiveModule<'_>,
    graph: &ModuleGraph,
    node: usize,
    exported: &[Interface],
) -> Interface {
    let mut include_paths = Ordered::default();
    let mut definitions = Ordered::default();

    include_paths.extend(module.public_include_paths.iter().copied());
    definitions.push(&format!("{}=DLLIMPORT", api_macro(module.name())));
    definitions.extend(module.public_definitions.iter().copied());

    for edge in graph
        .edges(node)
        .iter()
        .filter(|edge| edge.visibility == Visibility::Public)
    {
        let dependency = &exported[edge.to];
        include_paths.extend(dependency.include_paths.iter().map(String::as_str));
        definitions.extend(dependency.definitions.iter().map(String::as_str));
    }

    Interface {
        include_paths: include_paths.into_vec(),
        definitions: definitions.into_vec(),
    }
}

fn resolve_module(
    active: &ActiveSet<'_>,
    graph: &ModuleGraph,
    node: usize,
    exported: &[Interface],
) -> ResolvedModulePlan {
    let module = &active.modules[node];
    let mut include_paths = Ordered::default();
    let mut definitions = Ordered::default();

    include_paths.extend(module.public_include_paths.iter().copied());
    include_paths.extend(module.private_include_paths.iter().copied());
    definitions.push(&format!("{}=DLLEXPORT", api_macro(module.name())));
    definitions.extend(module.public_definitions.iter().copied());
    definitions.extend(module.private_definitions.iter().copied());

    for edge in graph.edges(node) {
        let dependency = &exported[edge.to];
        include_paths.extend(dependency.include_paths.iter().map(String::as_str));
        definitions.extend(dependency.definitions.iter().map(String::as_str));
    }

    let direct: Vec<usize> = graph.edges(node).iter().map(|edge| edge.to).collect();
    let link_dependencies = graph
        .dependency_first(&direct)
        .into_iter()
        .map(|idx| active.modules[idx].name().to_string())
        .collect();

    let pch = module.descriptor.pch;
    let pch_header = match pch {
        PchPolicy::UseExplicit | PchPolicy::UseExplicitOrShared => {
            module.descriptor.private_pch_header.clone()
        }
        PchPolicy::NoPch | PchPolicy::UseShared => None,
    };

    ResolvedModulePlan {
        module: module.name().to_string(),
        pch,
        pch_header,
        include_paths: include_paths.into_vec(),
        definitions: definitions.into_vec(),
        link_dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildContext;
    use crate::phases::{filter, graph};
    use crate::store::DescriptorStore;

    fn plans(yaml: &str) -> Vec<ResolvedModulePlan> {
        let store = DescriptorStore::from_yaml(yaml).unwrap();
        let ctx = BuildContext::defaults(store.schema());
        let active = filter::execute(&store, &ctx).unwrap();
        let graph = graph::execute(&store, &active).unwrap();
        execute(&active, &graph).unwrap()
    }

    fn plan<'p>(plans: &'p [ResolvedModulePlan], name: &str) -> &'p ResolvedModulePlan {
        plans.iter().find(|p| p.module == name).unwrap()
    }

    const CHAIN: &str = r#"
modules:
  - name: Core
    public_include_paths: [Core/Public]
    private_include_paths: [Core/Private]
  - name: Engine
    public_include_paths: [Engine/Public]
    public_dependencies: [Core]
  - name: Game
    public_include_paths: [Game]
    public_dependencies: [Engine]
"#;

    #[test]
    fn test_public_chain_propagates_paths() {
        let plans = plans(CHAIN);
        let game = plan(&plans, "Game");
        assert_eq!(
            game.include_paths,
            vec!["Game", "Engine/Public", "Core/Public"]
        );
        assert_eq!(game.link_dependencies, vec!["Core", "Engine"]);
    }

    #[test]
    fn test_private_paths_stay_private() {
        let plans = plans(CHAIN);
        assert_eq!(
            plan(&plans, "Core").include_paths,
            vec!["Core/Public", "Core/Private"]
        );
        assert!(!plan(&plans, "Engine")
            .include_paths
            .contains(&"Core/Private".to_string()));
    }

    #[test]
    fn test_private_edge_does_not_reexport() {
        let plans = plans(
            r#"
modules:
  - name: C
    public_include_paths: [C/Public]
  - name: B
    public_include_paths: [B/Public]
    private_dependencies: [C]
  - name: A
    public_dependencies: [B]
"#,
        );
        let b = plan(&plans, "B");
        assert_eq!(b.include_paths, vec!["B/Public", "C/Public"]);

        let a = plan(&plans, "A");
        assert_eq!(a.include_paths, vec!["B/Public"]);
        assert!(!a.definitions.contains(&"C_API=DLLIMPORT".to_string()));
        // C still has to be linked
        assert_eq!(a.link_dependencies, vec!["C", "B"]);
    }

    #[test]
    fn test_api_macros_and_definitions() {
        let plans = plans(
            r#"
modules:
  - name: Core
    public_definitions: [WITH_CORE=1]
    private_definitions: [CORE_INTERNAL=1]
  - name: OriginalGame
    public_dependencies: [Core]
    private_definitions: [GAME_LOG=1]
"#,
        );
        assert_eq!(
            plan(&plans, "OriginalGame").definitions,
            vec![
                "ORIGINALGAME_API=DLLEXPORT",
                "GAME_LOG=1",
                "CORE_API=DLLIMPORT",
                "WITH_CORE=1",
            ]
        );
        assert_eq!(
            plan(&plans, "Core").definitions,
            vec!["CORE_API=DLLEXPORT", "WITH_CORE=1", "CORE_INTERNAL=1"]
        );
    }

    #[test]
    fn test_diamond_paths_are_deduplicated() {
        let plans = plans(
            r#"
modules:
  - name: Core
    public_include_paths: [Core/Public]
  - name: Left
    public_dependencies: [Core]
  - name: Right
    public_dependencies: [Core]
  - name: Top
    public_dependencies: [Left, Right]
"#,
        );
        let top = plan(&plans, "Top");
        assert_eq!(top.include_paths, vec!["Core/Public"]);
        assert_eq!(top.link_dependencies, vec!["Core", "Left", "Right"]);
        assert_eq!(
            top.definitions
                .iter()
                .filter(|d| d.as_str() == "CORE_API=DLLIMPORT")
                .count(),
            1
        );
    }

    #[test]
    fn test_pch_header_follows_policy() {
        let plans = plans(
            r#"
modules:
  - name: A
    pch: UseExplicit
    private_pch_header: A/APCH.h
  - name: B
    pch: UseShared
    private_pch_header: B/BPCH.h
  - name: C
"#,
        );
        assert_eq!(plan(&plans, "A").pch_header.as_deref(), Some("A/APCH.h"));
        assert_eq!(plan(&plans, "B").pch_header, None);
        assert_eq!(plan(&plans, "C").pch, PchPolicy::UseExplicitOrShared);
        assert_eq!(plan(&plans, "C").pch_header, None);
    }

    #[test]
    fn test_api_macro() {
        assert_eq!(api_macro("OriginalGameEditor"), "ORIGINALGAMEEDITOR_API");
    }
}
