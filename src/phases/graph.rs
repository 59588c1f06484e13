//! Phase 2: Graph Construction
//!
//! This phase connects the active modules into a directed graph whose edges
//! point from a module to the modules it depends on, each tagged public or
//! private.
//!
//! ## Process
//!
//! 1.  **Nodes**: One node per active module, numbered by its position in the
//!     [`ActiveSet`].
//!
//! 2.  **Edges**: For each module, its public dependencies in declared order,
//!     then its private dependencies in declared order. A repeated dependency
//!     is dropped with a warning; a module listed both ways keeps its public
//!     edge. A name with no active module is an `UnresolvedReference`, and a
//!     module naming itself is a one-step cycle.
//!
//! 3.  **Cycle Detection**: A depth-first traversal colours nodes white, gray
//!     (on the current path) and black (finished). Reaching a gray node closes
//!     a cycle, reported with its full path. The post-order of the same
//!     traversal is the dependency-first order used by the later phases.

use std::collections::HashMap;

use log::{debug, warn};

use super::{ActiveModule, ActiveSet, Visibility};
use crate::error::{Error, Result};
use crate::store::DescriptorStore;
use crate::suggestions;

/// A dependency edge, from the module that owns the edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Node index of the dependency.
    pub to: usize,
    pub visibility: Visibility,
}

/// Dependency graph over the active set. Acyclic once built.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    edges: Vec<Vec<Edge>>,
    order: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl ModuleGraph {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Outgoing edges of a node, public edges first.
    pub fn edges(&self, node: usize) -> &[Edge] {
        &self.edges[node]
    }

    /// Every node, each after all of its dependencies.
    pub fn topological_order(&self) -> &[usize] {
        &self.order
    }

    /// Nodes reachable from `roots`, each after all of its dependencies.
    ///
    /// Roots are expanded in the given order and dependencies in edge order,
    /// so the result is deterministic.
    pub fn dependency_first(&self, roots: &[usize]) -> Vec<usize> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.len()];
        for &root in roots {
            self.postorder(root, &mut visited, &mut order);
        }
        order
    }

    fn postorder(&self, node: usize, visited: &mut [bool], order: &mut Vec<usize>) {
        if visited[node] {
            return;
        }
        visited[node] = true;
        for edge in &self.edges[node] {
            self.postorder(edge.to, visited, order);
        }
        order.push(node);
    }
}

/// Execute Phase 2: Build the dependency graph of the active set
///
/// `store` is only consulted to tell a misspelt dependency from one that is
/// declared but inactive under the current context.
pub fn execute(store: &DescriptorStore, active: &ActiveSet<'_>) -> Result<ModuleGraph> {
    let mut edges = Vec::with_capacity(active.modules.len());
    for module in &active.modules {
        edges.push(module_edges(store, active, module)?);
    }

    let order = detect_cycles(active, &edges)?;
    debug!(
        "Dependency graph: {} nodes, {} edges",
        edges.len(),
        edges.iter().map(Vec::len).sum::<usize>()
    );

    Ok(ModuleGraph { edges, order })
}

fn module_edges(
    store: &DescriptorStore,
    active: &ActiveSet<'_>,
    module: &ActiveModule<'_>,
) -> Result<Vec<Edge>> {
    let owner = module.name();
    let mut listed: HashMap<&str, Visibility> = HashMap::new();
    let mut edges = Vec::new();

    let declared = module
        .public_dependencies
        .iter()
        .map(|dep| (*dep, Visibility::Public))
        .chain(
            module
                .private_dependencies
                .iter()
                .map(|dep| (*dep, Visibility::Private)),
        );

    for (dependency, visibility) in declared {
        if dependency == owner {
            return Err(Error::CyclicDependency {
                cycle: vec![owner.to_string(), owner.to_string()],
            });
        }
        if let Some(previous) = listed.get(dependency) {
            if *previous == Visibility::Public && visibility == Visibility::Private {
                warn!(
                    "Module '{}' lists '{}' as both public and private dependency; treating it as public",
                    owner, dependency
                );
            } else {
                warn!(
                    "Module '{}' lists dependency '{}' more than once; ignoring the repeat",
                    owner, dependency
                );
            }
            continue;
        }

        let to = active
            .position(dependency)
            .ok_or_else(|| Error::UnresolvedReference {
                owner: owner.to_string(),
                reference: dependency.to_string(),
                hint: suggestions::unresolved_module(
                    dependency,
                    active.module_names(),
                    !store.modules_named(dependency).is_empty(),
                ),
            })?;
        listed.insert(dependency, visibility);
        edges.push(Edge { to, visibility });
    }
    Ok(edges)
}

/// Runs the white/gray/black traversal over every node in index order and
/// returns the post-order, or the first cycle found.
fn detect_cycles(active: &ActiveSet<'_>, edges: &[Vec<Edge>]) -> Result<Vec<usize>> {
    let mut colors = vec![Color::White; edges.len()];
    let mut path = Vec::new();
    let mut order = Vec::with_capacity(edges.len());

    for node in 0..edges.len() {
        if colors[node] == Color::White {
            visit(node, edges, &mut colors, &mut path, &mut order)
                .map_err(|cycle| Error::CyclicDependency {
                    cycle: cycle
                        .into_iter()
                        .map(|idx| active.modules[idx].name().to_string())
                        .collect(),
                })?;
        }
    }
    Ok(order)
}

fn visit(
    node: usize,
    edges: &[Vec<Edge>],
    colors: &mut [Color],
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> std::result::Result<(), Vec<usize>> {
    colors[node] = Color::Gray;
    path.push(node);

    for edge in &edges[node] {
        match colors[edge.to] {
            Color::Gray => {
                // Cycle runs from the first occurrence of `edge.to` on the path
                let start = path.iter().position(|&n| n == edge.to).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(edge.to);
                return Err(cycle);
            }
            Color::White => visit(edge.to, edges, colors, path, order)?,
            Color::Black => {}
        }
    }

    path.pop();
    colors[node] = Color::Black;
    order.push(node);
    Ok(())
}
