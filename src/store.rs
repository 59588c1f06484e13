//! # Descriptor Store
//!
//! The store owns every module and target descriptor for the lifetime of a
//! resolution session. Descriptors live in plain vectors (an arena) and are
//! looked up by name through an index; nothing outside the store holds a
//! descriptor by value, and later phases refer to them by position.
//!
//! Construction validates what can be checked without a build context:
//!
//! - module and target names are C identifiers (each module contributes a
//!   `<NAME>_API` macro);
//! - a name is used by at most one *unconditional* descriptor of each kind.
//!   Several descriptors may share a name when each has a `when` condition,
//!   which is how engine-era variants of the same target coexist;
//! - `UseExplicit` PCH policy comes with a `private_pch_header`.
//!
//! Whether the conditions themselves fit the context schema is checked by the
//! context filter, since that is where they are evaluated.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::config::{self, DescriptorSet, ModuleDescriptor, PchPolicy, TargetDescriptor};
use crate::context::ContextSchema;
use crate::error::{Error, Result};

/// Position of a module descriptor in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub usize);

/// Position of a target descriptor in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub usize);

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// Immutable, name-indexed collection of descriptors.
#[derive(Debug, Default)]
pub struct DescriptorStore {
    schema: ContextSchema,
    modules: Vec<ModuleDescriptor>,
    targets: Vec<TargetDescriptor>,
    module_index: BTreeMap<String, Vec<ModuleId>>,
    target_index: BTreeMap<String, Vec<TargetId>>,
}

impl DescriptorStore {
    /// Validates and indexes a loaded descriptor set.
    pub fn new(set: DescriptorSet) -> Result<Self> {
        let DescriptorSet {
            context,
            modules,
            targets,
            ..
        } = set;

        for (flag, spec) in &context {
            spec.check(flag)?;
        }

        let mut module_index: BTreeMap<String, Vec<ModuleId>> = BTreeMap::new();
        for (idx, module) in modules.iter().enumerate() {
            validate_name(&module.name)?;
            validate_pch(module)?;
            module_index
                .entry(module.name.clone())
                .or_default()
                .push(ModuleId(idx));
        }
        for (name, ids) in &module_index {
            let unconditional = ids.iter().filter(|id| modules[id.0].when.is_none()).count();
            if ids.len() > 1 && unconditional > 0 {
                return Err(Error::DuplicateDescriptor {
                    kind: "module".to_string(),
                    name: name.clone(),
                });
            }
        }

        let mut target_index: BTreeMap<String, Vec<TargetId>> = BTreeMap::new();
        for (idx, target) in targets.iter().enumerate() {
            validate_name(&target.name)?;
            target_index
                .entry(target.name.clone())
                .or_default()
                .push(TargetId(idx));
        }
        for (name, ids) in &target_index {
            let unconditional = ids.iter().filter(|id| targets[id.0].when.is_none()).count();
            if ids.len() > 1 && unconditional > 0 {
                return Err(Error::DuplicateDescriptor {
                    kind: "target".to_string(),
                    name: name.clone(),
                });
            }
        }

        debug!(
            "Descriptor store: {} modules, {} targets, {} context flags",
            modules.len(),
            targets.len(),
            context.len()
        );

        Ok(Self {
            schema: context,
            modules,
            targets,
            module_index,
            target_index,
        })
    }

    /// Loads a descriptor file or directory and builds the store from it.
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(config::from_path(path)?)
    }

    /// Builds a store from a single YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut set = DescriptorSet::default();
        set.merge(config::parse_yaml(content)?)?;
        Self::new(set)
    }

    pub fn schema(&self) -> &ContextSchema {
        &self.schema
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn targets(&self) -> &[TargetDescriptor] {
        &self.targets
    }

    pub fn module(&self, id: ModuleId) -> &ModuleDescriptor {
        &self.modules[id.0]
    }

    pub fn target(&self, id: TargetId) -> &TargetDescriptor {
        &self.targets[id.0]
    }

    /// Every descriptor declared under a module name, in declaration order.
    pub fn modules_named(&self, name: &str) -> &[ModuleId] {
        self.module_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every descriptor declared under a target name, in declaration order.
    pub fn targets_named(&self, name: &str) -> &[TargetId] {
        self.target_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct module names, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.module_index.keys().map(String::as_str)
    }

    /// Distinct target names, sorted.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.target_index.keys().map(String::as_str)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidDescriptor {
            name: name.to_string(),
            message: "names must start with a letter or '_' and contain only letters, digits and '_'"
                .to_string(),
        })
    }
}

fn validate_pch(module: &ModuleDescriptor) -> Result<()> {
    if module.pch == PchPolicy::UseExplicit && module.private_pch_header.is_none() {
        return Err(Error::InvalidDescriptor {
            name: module.name.clone(),
            message: "pch 'UseExplicit' requires 'private_pch_header'".to_string(),
        });
    }
    Ok(())
}
