//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the module
//! dependency tree of a target in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Dependency Visualization**: Displays each root module of the target
//!   and its dependencies, labelled with the edge visibility
//! - **Depth Control**: Supports `--depth` flag to limit tree depth
//! - **Shared Subtrees**: A module already expanded elsewhere in the tree is
//!   printed once more with `(*)` and not expanded again
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::collections::HashSet;

use anyhow::{Context, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};

use buildplan::phases::{Session, Visibility};

use super::DescriptorArgs;

/// Display the dependency tree of a target
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Target whose dependency tree is displayed
    #[arg(value_name = "TARGET")]
    pub target: String,

    #[command(flatten)]
    pub descriptors: DescriptorArgs,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the target, 1 to show its root modules, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let store = args.descriptors.load()?;
    let context = args.descriptors.context(&store)?;
    let session = Session::new(&store, context)?;

    let tree = build_tree(&session, &args.target, args.depth.unwrap_or(usize::MAX))?;
    print_tree(&tree).context("Failed to display tree")?;
    Ok(())
}

/// Builds the display tree of a target.
pub fn build_tree(session: &Session<'_>, target: &str, max_depth: usize) -> Result<TreeNode> {
    let plan = session
        .plan(target)
        .with_context(|| format!("Failed to resolve target '{}'", target))?;

    let mut expanded = HashSet::new();
    let children = if max_depth == 0 {
        vec![]
    } else {
        plan.root_modules
            .iter()
            .filter_map(|module| session.active().position(module))
            .map(|node| build_module_node(session, node, None, max_depth, 1, &mut expanded))
            .collect()
    };

    Ok(TreeNode {
        label: format!("{} [{:?}] {}", plan.target, plan.kind, session.context()),
        children,
    })
}

fn build_module_node(
    session: &Session<'_>,
    node: usize,
    visibility: Option<Visibility>,
    max_depth: usize,
    current_depth: usize,
    expanded: &mut HashSet<usize>,
) -> TreeNode {
    let name = session.active().modules[node].name();
    let mut label = match visibility {
        Some(visibility) => format!("{} ({})", name, visibility),
        None => name.to_string(),
    };

    let edges = session.graph().edges(node);
    if edges.is_empty() || current_depth >= max_depth {
        return TreeNode {
            label,
            children: vec![],
        };
    }
    if !expanded.insert(node) {
        label.push_str(" (*)");
        return TreeNode {
            label,
            children: vec![],
        };
    }

    let children = edges
        .iter()
        .map(|edge| {
            build_module_node(
                session,
                edge.to,
                Some(edge.visibility),
                max_depth,
                current_depth + 1,
                expanded,
            )
        })
        .collect();
    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
