//! Property-based tests for resolution over random dependency graphs.
//!
//! Graphs are generated acyclic by only letting a module depend on modules
//! with a lower index; the cycle property then adds one edge going back up.

#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;

    use crate::config::{DescriptorSet, ModuleDescriptor, TargetDescriptor, TargetKind};
    use crate::context::BuildContext;
    use crate::error::Error;
    use crate::phases::propagate::api_macro;
    use crate::phases::{emit, Session};
    use crate::store::DescriptorStore;
    use proptest::prelude::*;

    fn name(idx: usize) -> String {
        format!("M{}", idx)
    }

    /// Edges `(from, to, public)` with `to < from`, deduplicated.
    fn normalize(count: usize, raw: &[(usize, usize, bool)]) -> Vec<(usize, usize, bool)> {
        let mut seen = HashSet::new();
        raw.iter()
            .filter_map(|&(a, b, public)| {
                let (a, b) = (a % count, b % count);
                if a == b {
                    return None;
                }
                let (from, to) = (a.max(b), a.min(b));
                seen.insert((from, to)).then_some((from, to, public))
            })
            .collect()
    }

    fn store(count: usize, edges: &[(usize, usize, bool)]) -> DescriptorStore {
        let mut modules: Vec<ModuleDescriptor> = (0..count)
            .map(|idx| ModuleDescriptor {
                name: name(idx),
                public_include_paths: vec![format!("{}/Public", name(idx))],
                private_include_paths: vec![format!("{}/Private", name(idx))],
                ..Default::default()
            })
            .collect();
        for &(from, to, public) in edges {
            if public {
                modules[from].public_dependencies.push(name(to));
            } else {
                modules[from].private_dependencies.push(name(to));
            }
        }
        let target = TargetDescriptor {
            name: "Target".to_string(),
            kind: TargetKind::Game,
            when: None,
            build_settings: Default::default(),
            include_order: Default::default(),
            extra_modules: vec![name(count - 1)],
            definitions: vec![],
            conditionals: vec![],
        };
        let set = DescriptorSet {
            modules,
            targets: vec![target],
            ..Default::default()
        };
        DescriptorStore::new(set).unwrap()
    }

    /// Modules reachable from `root` over any edge, root included.
    fn reachable(root: usize, edges: &[(usize, usize, bool)], public_only: bool) -> HashSet<usize> {
        let mut found = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for &(from, to, public) in edges {
                if from == node && (public || !public_only) && found.insert(to) {
                    stack.push(to);
                }
            }
        }
        found
    }

    fn graph() -> impl Strategy<Value = (usize, Vec<(usize, usize, bool)>)> {
        (2usize..12, prop::collection::vec((0usize..12, 0usize..12, any::<bool>()), 0..40))
            .prop_map(|(count, raw)| {
                let edges = normalize(count, &raw);
                (count, edges)
            })
    }

    proptest! {
        /// Property: every reachable module gets exactly one plan
        #[test]
        fn one_plan_per_reachable_module((count, edges) in graph()) {
            let store = store(count, &edges);
            let session = Session::new(&store, BuildContext::default()).unwrap();
            let plan = session.plan("Target").unwrap();

            let expected: HashSet<String> =
                reachable(count - 1, &edges, false).into_iter().map(name).collect();
            let planned: Vec<&str> = plan.modules.iter().map(|m| m.module.as_str()).collect();
            let unique: HashSet<String> = planned.iter().map(|m| m.to_string()).collect();

            prop_assert_eq!(planned.len(), unique.len());
            prop_assert_eq!(unique, expected);
        }

        /// Property: link order puts every dependency before its dependents
        #[test]
        fn link_order_is_dependency_first((count, edges) in graph()) {
            let store = store(count, &edges);
            let plan = crate::phases::resolve(&store, BuildContext::default(), "Target").unwrap();
            let position = |module: &str| plan.link_order.iter().position(|m| m == module);

            for &(from, to, _) in &edges {
                if let Some(from_pos) = position(&name(from)) {
                    let to_pos = position(&name(to));
                    prop_assert!(to_pos.is_some_and(|p| p < from_pos));
                }
            }
            prop_assert_eq!(plan.link_order.last().cloned(), Some(name(count - 1)));
        }

        /// Property: public include paths follow public edges only
        #[test]
        fn include_paths_follow_visibility((count, edges) in graph()) {
            let store = store(count, &edges);
            let session = Session::new(&store, BuildContext::default()).unwrap();

            for idx in 0..count {
                let plan = session.module_plan(&name(idx)).unwrap();
                let mut visible = HashSet::from([idx]);
                for &(from, to, _) in &edges {
                    if from == idx {
                        visible.extend(reachable(to, &edges, true));
                    }
                }
                let expected: HashSet<String> = visible
                    .iter()
                    .map(|&m| format!("{}/Public", name(m)))
                    .chain(std::iter::once(format!("{}/Private", name(idx))))
                    .collect();
                let actual: HashSet<String> = plan.include_paths.iter().cloned().collect();

                prop_assert_eq!(plan.include_paths.len(), actual.len());
                prop_assert_eq!(actual, expected);
            }
        }

        /// Property: resolution is deterministic
        #[test]
        fn resolution_is_deterministic((count, edges) in graph()) {
            let first = store(count, &edges);
            let second = store(count, &edges);
            let a = crate::phases::resolve(&first, BuildContext::default(), "Target").unwrap();
            let b = crate::phases::resolve(&second, BuildContext::default(), "Target").unwrap();
            prop_assert_eq!(emit::to_json(&a).unwrap(), emit::to_json(&b).unwrap());
        }

        /// Property: with every module as a root, each API macro is defined
        /// once in the target and every root exports its own
        #[test]
        fn roots_export_their_api_once((count, edges) in graph()) {
            let base = store(count, &edges);
            let mut targets = base.targets().to_vec();
            targets[0].extra_modules = (0..count).rev().map(name).collect();
            let all_roots = DescriptorStore::new(DescriptorSet {
                modules: base.modules().to_vec(),
                targets,
                ..Default::default()
            })
            .unwrap();

            let plan = crate::phases::resolve(&all_roots, BuildContext::default(), "Target").unwrap();
            let api: Vec<&String> = plan.definitions.iter().filter(|d| d.contains("_API=")).collect();
            prop_assert_eq!(api.len(), count);
            for idx in 0..count {
                let export = format!("{}=DLLEXPORT", api_macro(&name(idx)));
                prop_assert!(plan.definitions.contains(&export));
            }
        }

        /// Property: an edge from a module back to one of its dependents is
        /// always reported as a cycle through both modules
        #[test]
        fn back_edge_is_a_cycle((count, edges) in graph(), pick in any::<prop::sample::Index>()) {
            prop_assume!(!edges.is_empty());
            let (from, to, _) = edges[pick.index(edges.len())];

            let mut modules = store(count, &edges).modules().to_vec();
            modules[to].public_dependencies.push(name(from));
            let cyclic = DescriptorStore::new(DescriptorSet { modules, ..Default::default() }).unwrap();

            let err = Session::new(&cyclic, BuildContext::default()).unwrap_err();
            match err {
                Error::CyclicDependency { cycle } => {
                    prop_assert!(cycle.len() >= 3);
                    prop_assert_eq!(cycle.first(), cycle.last());
                    prop_assert!(cycle.contains(&name(from)));
                    prop_assert!(cycle.contains(&name(to)));
                }
                other => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
