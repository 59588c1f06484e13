//! Phase 1: Context Filtering
//!
//! This is the first phase of a resolution. It applies the build context to
//! the raw descriptors in the store and produces the [`ActiveSet`]: the
//! descriptors whose `when` condition matches, each with the lists of its
//! matching conditional blocks appended to its base lists.
//!
//! ## Process
//!
//! 1.  **Validation**: Every condition in the store is checked against the
//!     context schema, whether or not it ends up matching. A misspelt flag on
//!     a block that happens to be inactive today is still a defect.
//!
//! 2.  **Selection**: Descriptors are kept in store order when their `when`
//!     matches (or is absent). Two kept descriptors with the same name are a
//!     `DuplicateDescriptor` error.
//!
//! 3.  **Expansion**: Matching conditional blocks are appended in block order.
//!
//! The phase is pure: the same store and context always give the same set.

use std::collections::HashSet;

use log::{debug, trace};

use super::{ActiveModule, ActiveSet, ActiveTarget};
use crate::config::{ModuleDescriptor, TargetDescriptor};
use crate::context::{BuildContext, Condition, ContextSchema};
use crate::error::{Error, Result};
use crate::store::{DescriptorStore, ModuleId, TargetId};

/// Execute Phase 1: Select the descriptors active under `context`
pub fn execute<'a>(store: &'a DescriptorStore, context: &BuildContext) -> Result<ActiveSet<'a>> {
    validate_conditions(store)?;

    let mut modules = Vec::new();
    let mut seen = HashSet::new();
    for (idx, descriptor) in store.modules().iter().enumerate() {
        if !selected(descriptor.when.as_ref(), context) {
            trace!("Module '{}' is inactive under {}", descriptor.name, context);
            continue;
        }
        if !seen.insert(descriptor.name.as_str()) {
            return Err(Error::DuplicateDescriptor {
                kind: "module".to_string(),
                name: descriptor.name.clone(),
            });
        }
        modules.push(activate_module(ModuleId(idx), descriptor, context));
    }

    let mut targets = Vec::new();
    let mut seen = HashSet::new();
    for (idx, descriptor) in store.targets().iter().enumerate() {
        if !selected(descriptor.when.as_ref(), context) {
            trace!("Target '{}' is inactive under {}", descriptor.name, context);
            continue;
        }
        if !seen.insert(descriptor.name.as_str()) {
            return Err(Error::DuplicateDescriptor {
                kind: "target".to_string(),
                name: descriptor.name.clone(),
            });
        }
        targets.push(activate_target(TargetId(idx), descriptor, context));
    }

    debug!(
        "Context {} activates {}/{} modules and {}/{} targets",
        context,
        modules.len(),
        store.modules().len(),
        targets.len(),
        store.targets().len()
    );

    Ok(ActiveSet::new(modules, targets))
}

/// Checks every condition in the store against the context schema.
pub fn validate_conditions(store: &DescriptorStore) -> Result<()> {
    let schema = store.schema();
    for module in store.modules() {
        let blocks = module.conditionals.iter().map(|c| &c.when);
        validate_all(schema, &module.name, module.when.as_ref(), blocks)?;
    }
    for target in store.targets() {
        let blocks = target.conditionals.iter().map(|c| &c.when);
        validate_all(schema, &target.name, target.when.as_ref(), blocks)?;
    }
    Ok(())
}

fn validate_all<'c>(
    schema: &ContextSchema,
    owner: &str,
    when: Option<&Condition>,
    blocks: impl Iterator<Item = &'c Condition>,
) -> Result<()> {
    if let Some(when) = when {
        when.validate(schema, owner)?;
    }
    for condition in blocks {
        condition.validate(schema, owner)?;
    }
    Ok(())
}

fn selected(when: Option<&Condition>, context: &BuildContext) -> bool {
    when.map_or(true, |condition| condition.matches(context))
}

fn extend<'a>(list: &mut Vec<&'a str>, items: &'a [String]) {
    list.extend(items.iter().map(String::as_str));
}

fn activate_module<'a>(
    id: ModuleId,
    descriptor: &'a ModuleDescriptor,
    context: &BuildContext,
) -> ActiveModule<'a> {
    let mut module = ActiveModule {
        id,
        descriptor,
        public_dependencies: Vec::new(),
        private_dependencies: Vec::new(),
        public_include_paths: Vec::new(),
        private_include_paths: Vec::new(),
        public_definitions: Vec::new(),
        private_definitions: Vec::new(),
    };
    extend(&mut module.public_dependencies, &descriptor.public_dependencies);
    extend(&mut module.private_dependencies, &descriptor.private_dependencies);
    extend(&mut module.public_include_paths, &descriptor.public_include_paths);
    extend(&mut module.private_include_paths, &descriptor.private_include_paths);
    extend(&mut module.public_definitions, &descriptor.public_definitions);
    extend(&mut module.private_definitions, &descriptor.private_definitions);

    for block in descriptor
        .conditionals
        .iter()
        .filter(|block| block.when.matches(context))
    {
        trace!("Module '{}': applying block when {}", descriptor.name, block.when);
        extend(&mut module.public_dependencies, &block.public_dependencies);
        extend(&mut module.private_dependencies, &block.private_dependencies);
        extend(&mut module.public_include_paths, &block.public_include_paths);
        extend(&mut module.private_include_paths, &block.private_include_paths);
        extend(&mut module.public_definitions, &block.public_definitions);
        extend(&mut module.private_definitions, &block.private_definitions);
    }
    module
}

fn activate_target<'a>(
    id: TargetId,
    descriptor: &'a TargetDescriptor,
    context: &BuildContext,
) -> ActiveTarget<'a> {
    let mut target = ActiveTarget {
        id,
        descriptor,
        extra_modules: Vec::new(),
        definitions: Vec::new(),
    };
    extend(&mut target.extra_modules, &descriptor.extra_modules);
    extend(&mut target.definitions, &descriptor.definitions);
    for block in descriptor
        .conditionals
        .iter()
        .filter(|block| block.when.matches(context))
    {
        extend(&mut target.extra_modules, &block.extra_modules);
        extend(&mut target.definitions, &block.definitions);
    }
    target
}
