//! Orchestrator for complete resolutions
//!
//! This module coordinates the phases into a [`Session`]: phases 1-3 run once
//! per (store, context) pair, and phase 4 runs once per requested target
//! against the shared, read-only session data.

use log::info;
use rayon::prelude::*;

use super::{phase1, phase2, phase3, phase4};
use super::{ActiveSet, BuildPlan, ModuleGraph, ResolvedModulePlan};
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::store::DescriptorStore;
use crate::suggestions;

/// A store resolved under one build context.
///
/// Immutable once built, so plans for several targets can be emitted
/// concurrently.
#[derive(Debug)]
pub struct Session<'a> {
    store: &'a DescriptorStore,
    context: BuildContext,
    active: ActiveSet<'a>,
    graph: ModuleGraph,
    plans: Vec<ResolvedModulePlan>,
}

impl<'a> Session<'a> {
    /// Runs the shared phases:
    /// 1. Context filtering
    /// 2. Graph construction and cycle detection
    /// 3. Visibility propagation
    pub fn new(store: &'a DescriptorStore, context: BuildContext) -> Result<Self> {
        // Phase 1: Context Filtering
        let active = phase1::execute(store, &context)?;

        // Phase 2: Graph Construction
        let graph = phase2::execute(store, &active)?;

        // Phase 3: Visibility Propagation
        let plans = phase3::execute(&active, &graph)?;

        info!(
            "Resolved {} active modules under {}",
            active.modules.len(),
            context
        );

        Ok(Self {
            store,
            context,
            active,
            graph,
            plans,
        })
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn active(&self) -> &ActiveSet<'a> {
        &self.active
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Resolved plan of an active module.
    pub fn module_plan(&self, module: &str) -> Option<&ResolvedModulePlan> {
        self.active.position(module).map(|idx| &self.plans[idx])
    }

    /// Names of the targets active under this session's context.
    pub fn target_names(&self) -> Vec<&'a str> {
        self.active.targets.iter().map(|t| t.name()).collect()
    }

    /// Phase 4: Emit the plan of one target
    pub fn plan(&self, target: &str) -> Result<BuildPlan> {
        let active_target = self.active.target(target).ok_or_else(|| Error::UnknownTarget {
            target: target.to_string(),
            hint: suggestions::unknown_target(
                target,
                self.target_names(),
                !self.store.targets_named(target).is_empty(),
            ),
        })?;
        phase4::execute(
            self.store,
            &self.active,
            &self.graph,
            &self.plans,
            &self.context,
            active_target,
        )
    }

    /// Emits several plans in parallel. Results keep the request order.
    pub fn plan_all<S>(&self, targets: &[S]) -> Vec<Result<BuildPlan>>
    where
        S: AsRef<str> + Sync,
    {
        targets
            .par_iter()
            .map(|target| self.plan(target.as_ref()))
            .collect()
    }
}

/// Resolves a single target in one call.
pub fn resolve(store: &DescriptorStore, context: BuildContext, target: &str) -> Result<BuildPlan> {
    Session::new(store, context)?.plan(target)
}
