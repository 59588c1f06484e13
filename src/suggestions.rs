//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! The library errors carry an optional `hint` field that the resolver fills
//! from the functions here; CLI-only failures get a ready-made
//! `anyhow::Error`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Descriptor file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

/// Generate an error for when the descriptor file is not found.
///
/// Includes hints about:
/// - Creating a new descriptor file
/// - Using the -c/--config flag
/// - Using the BUILDPLAN_CONFIG environment variable
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Descriptor file not found: {path}\n\n\
         hint: Create a buildplan.yaml file in your project root\n\
         hint: Use -c/--config to point at a file or a directory of *.build.yaml fragments\n\
         hint: Set BUILDPLAN_CONFIG environment variable",
        path = path.display()
    )
}

/// Hint for a dependency or root module that is not in the active set.
///
/// `declared` is true when the store has a descriptor of that name whose
/// `when` condition does not match the current build context.
pub fn unresolved_module<'a>(
    reference: &str,
    active: impl IntoIterator<Item = &'a str>,
    declared: bool,
) -> Option<String> {
    if declared {
        return Some(format!(
            "Module '{reference}' is declared but inactive under this build context; \
             guard the dependency with the same condition"
        ));
    }
    did_you_mean(reference, active)
}

/// Hint for a requested target that is not in the active set.
pub fn unknown_target<'a>(
    target: &str,
    active: impl IntoIterator<Item = &'a str>,
    declared: bool,
) -> Option<String> {
    if declared {
        return Some(format!(
            "Target '{target}' is declared but inactive under this build context; \
             check the --set values"
        ));
    }
    let active: Vec<&str> = active.into_iter().collect();
    did_you_mean(target, active.iter().copied()).or_else(|| {
        if active.is_empty() {
            Some("No target is active under this build context".to_string())
        } else {
            Some(format!("Active targets are: {}", active.join(", ")))
        }
    })
}

/// "Did you mean ..." for a misspelt name, when a close candidate exists.
pub fn did_you_mean<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    find_similar(input, candidates).map(|s| format!("Did you mean '{s}'?"))
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub(crate) fn find_similar<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = edit_distance(&input.to_lowercase(), &candidate.to_lowercase());
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_includes_hints() {
        let path = Path::new("/some/path/buildplan.yaml");
        let error = config_not_found(path);
        let message = error.to_string();

        assert!(message.contains("Descriptor file not found"));
        assert!(message.contains("/some/path/buildplan.yaml"));
        assert!(message.contains("hint:"));
        assert!(message.contains("-c/--config"));
        assert!(message.contains("BUILDPLAN_CONFIG"));
    }

    #[test]
    fn test_unresolved_module_suggests_similar() {
        let hint = unresolved_module("Engien", ["Core", "Engine"], false);
        assert_eq!(hint.as_deref(), Some("Did you mean 'Engine'?"));

        assert_eq!(unresolved_module("Niagara", ["Core", "Engine"], false), None);
    }

    #[test]
    fn test_unresolved_module_declared_but_inactive() {
        let hint = unresolved_module("UnrealEd", ["Core"], true).unwrap();
        assert!(hint.contains("declared but inactive"));
    }

    #[test]
    fn test_unknown_target_lists_active_targets() {
        let hint = unknown_target("Server", ["Game", "GameEditor"], false).unwrap();
        assert_eq!(hint, "Active targets are: Game, GameEditor");

        let hint = unknown_target("Gam", ["Game", "GameEditor"], false).unwrap();
        assert_eq!(hint, "Did you mean 'Game'?");

        let hint = unknown_target("Game", [], false).unwrap();
        assert!(hint.contains("No target is active"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("Engine", "Engine"), 0);
        assert_eq!(edit_distance("Engin", "Engine"), 1);
        assert_eq!(edit_distance("Engien", "Engine"), 2);
        assert_eq!(edit_distance("", "Core"), 4);
        assert_eq!(edit_distance("Slate", "UMG"), 5);
    }

    #[test]
    fn test_find_similar() {
        let candidates = ["Core", "CoreUObject", "Engine"];

        assert_eq!(find_similar("core", candidates), Some("Core"));
        assert_eq!(find_similar("CoreUObjct", candidates), Some("CoreUObject"));
        assert_eq!(find_similar("Slate", candidates), None);
    }
}
