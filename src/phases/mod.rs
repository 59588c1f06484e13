//! Implementation of the four phases of a resolution.
//!
//! ## Overview
//!
//! Resolving a target follows 4 phases:
//! 1. Context Filtering - Select the descriptors and conditional blocks active
//!    under the build context
//! 2. Graph Construction - Connect active modules by public/private edges and
//!    reject unresolved references and cycles
//! 3. Visibility Propagation - Compute each module's include paths,
//!    definitions and link set
//! 4. Plan Emission - Assemble the ordered build plan of a target
//!
//! Phases 1-3 depend only on the store and the context, so the
//! [`orchestrator::Session`] runs them once and then emits any number of
//! target plans from the shared, read-only result.
//!
//! Later phases never own descriptor data. They borrow strings from the
//! [`DescriptorStore`](crate::store::DescriptorStore) and refer to modules by
//! their position in the [`ActiveSet`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::{
    BuildSettingsVersion, IncludeOrderVersion, ModuleDescriptor, PchPolicy, TargetDescriptor,
    TargetKind,
};
use crate::store::{ModuleId, TargetId};

// Phase modules
pub mod emit;
pub mod filter;
pub mod graph;
pub mod orchestrator;
pub mod propagate;

pub use filter as phase1;
pub use graph as phase2;
pub use propagate as phase3;
pub use emit as phase4;

pub use graph::{Edge, ModuleGraph};
pub use orchestrator::{resolve, Session};

/// Whether a dependency's interface is re-exported to dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// A module as seen under one build context: base lists with every matching
/// conditional block appended.
#[derive(Debug, Clone)]
pub struct ActiveModule<'a> {
    pub id: ModuleId,
    pub descriptor: &'a ModuleDescriptor,
    pub public_dependencies: Vec<&'a str>,
    pub private_dependencies: Vec<&'a str>,
    pub public_include_paths: Vec<&'a str>,
    pub private_include_paths: Vec<&'a str>,
    pub public_definitions: Vec<&'a str>,
    pub private_definitions: Vec<&'a str>,
}

impl<'a> ActiveModule<'a> {
    pub fn name(&self) -> &'a str {
        &self.descriptor.name
    }
}

/// A target as seen under one build context.
#[derive(Debug, Clone)]
pub struct ActiveTarget<'a> {
    pub id: TargetId,
    pub descriptor: &'a TargetDescriptor,
    pub extra_modules: Vec<&'a str>,
    pub definitions: Vec<&'a str>,
}

impl<'a> ActiveTarget<'a> {
    pub fn name(&self) -> &'a str {
        &self.descriptor.name
    }
}

/// Output of phase 1: the descriptors selected by a build context.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet<'a> {
    /// Active modules in store declaration order.
    pub modules: Vec<ActiveModule<'a>>,
    /// Active targets in store declaration order.
    pub targets: Vec<ActiveTarget<'a>>,
    module_index: HashMap<&'a str, usize>,
    target_index: HashMap<&'a str, usize>,
}

impl<'a> ActiveSet<'a> {
    /// Builds the set and its name index. Names must already be unique.
    pub fn new(modules: Vec<ActiveModule<'a>>, targets: Vec<ActiveTarget<'a>>) -> Self {
        let module_index = modules
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.name(), idx))
            .collect();
        let target_index = targets
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.name(), idx))
            .collect();
        Self {
            modules,
            targets,
            module_index,
            target_index,
        }
    }

    /// Position of an active module, the node index used by later phases.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.module_index.get(name).copied()
    }

    pub fn module(&self, name: &str) -> Option<&ActiveModule<'a>> {
        self.position(name).map(|idx| &self.modules[idx])
    }

    pub fn target(&self, name: &str) -> Option<&ActiveTarget<'a>> {
        self.target_index.get(name).map(|&idx| &self.targets[idx])
    }

    pub fn module_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.modules.iter().map(ActiveModule::name)
    }
}

/// Resolved build inputs of one module under one build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModulePlan {
    pub module: String,
    pub pch: PchPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pch_header: Option<String>,
    /// Deduplicated, first-seen order.
    pub include_paths: Vec<String>,
    pub definitions: Vec<String>,
    /// Every module this one links against, dependencies first.
    pub link_dependencies: Vec<String>,
}

/// Everything the external builder needs to build one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub target: String,
    pub kind: TargetKind,
    pub build_settings: BuildSettingsVersion,
    pub include_order: IncludeOrderVersion,
    /// Flag values the plan was resolved under.
    pub context: BTreeMap<String, String>,
    pub root_modules: Vec<String>,
    /// PCH policy of the first root module.
    pub pch: PchPolicy,
    pub include_paths: Vec<String>,
    pub definitions: Vec<String>,
    /// Modules to link, dependencies before dependents.
    pub link_order: Vec<String>,
    /// One plan per reachable module, in link order.
    pub modules: Vec<ResolvedModulePlan>,
}

impl BuildPlan {
    pub fn module(&self, name: &str) -> Option<&ResolvedModulePlan> {
        self.modules.iter().find(|m| m.module == name)
    }
}
