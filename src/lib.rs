//! # buildplan
//!
//! This library resolves declarative module and target build descriptors
//! into fully resolved build plans: transitive include paths, link order,
//! compile definitions and precompiled header policy, honouring public and
//! private dependency visibility and build-context conditionals (editor vs
//! game, platform, engine era). It is used by the `buildplan` command-line
//! tool, and the plans it emits are meant for an external builder that
//! drives the actual compiler and linker.
//!
//! ## Quick Example
//!
//! ```
//! use buildplan::context::BuildContext;
//! use buildplan::phases;
//! use buildplan::store::DescriptorStore;
//!
//! let store = DescriptorStore::from_yaml(r#"
//! context:
//!   editor: { type: bool }
//! modules:
//!   - name: Core
//!     public_include_paths: [Core/Public]
//!   - name: Engine
//!     public_include_paths: [Engine/Public]
//!     public_dependencies: [Core]
//!   - name: Game
//!     public_dependencies: [Engine]
//! targets:
//!   - name: Game
//!     kind: Game
//!     extra_modules: [Game]
//! "#).unwrap();
//!
//! let context = BuildContext::defaults(store.schema());
//! let plan = phases::resolve(&store, context, "Game").unwrap();
//!
//! assert_eq!(plan.link_order, vec!["Core", "Engine", "Game"]);
//! assert_eq!(plan.include_paths, vec!["Engine/Public", "Core/Public"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Descriptors (`config`)**: The schema of descriptor documents (YAML,
//!   JSON or TOML) and the loaders that follow `include:` patterns and
//!   discover fragments in a source tree.
//! - **Build context (`context`)**: The flags descriptors may test, the
//!   `when:` conditions over them and the values supplied for one run.
//! - **Store (`store`)**: The validated, name-indexed arena of descriptors.
//! - **Phases (`phases`)**: The resolution pipeline and its outputs,
//!   [`phases::ResolvedModulePlan`] and [`phases::BuildPlan`].
//!
//! ## Execution Flow
//!
//! [`phases::Session`] runs the following steps:
//!
//! 1.  **Context Filtering**: Select the descriptors and conditional blocks
//!     that match the build context.
//! 2.  **Graph Construction**: Connect modules by public/private edges and
//!     reject unresolved names and cycles.
//! 3.  **Visibility Propagation**: Compute every module's include paths,
//!     definitions and link set.
//! 4.  **Plan Emission**: Assemble the ordered plan of each requested target.
//!
//! Steps 1-3 run once per session; step 4 runs per target and can run in
//! parallel.

pub mod config;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod output;
pub mod phases;
pub mod store;
pub mod suggestions;

#[cfg(test)]
mod resolve_proptest;
