//! # Error Handling
//!
//! This module defines the centralized error type for `buildplan`. It uses
//! `thiserror` to describe every failure mode of descriptor loading and
//! resolution with enough context to fix the descriptors without re-running
//! under a debugger.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Resolution defects (`UnresolvedReference`,
//!   `CyclicDependency`, `UnknownConditional`, `EmptyTarget`, `UnknownTarget`,
//!   `DuplicateDescriptor`, `InvalidDescriptor`) always name the offending
//!   module or target, and a cycle always carries its full path.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! None of these errors is recovered from inside the library. A descriptor
//! set that fails resolution has to be fixed at the source.

use thiserror::Error;

/// Renders an optional hint the same way for every variant that carries one.
fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

/// Main error type for buildplan operations
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor names a module that is not part of the active set.
    ///
    /// `owner` is the module or target holding the reference.
    #[error("Unresolved reference in '{owner}': no module named '{reference}'{}", hint_suffix(hint))]
    UnresolvedReference {
        owner: String,
        reference: String,
        /// Did-you-mean suggestion or a note about inactive descriptors
        hint: Option<String>,
    },

    /// The module dependency graph contains a cycle.
    ///
    /// `cycle` lists the modules along the cycle, starting and ending with
    /// the same module.
    #[error("Cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A condition or context assignment does not fit the context schema.
    #[error("Unknown conditional in '{owner}': flag '{flag}' {detail}")]
    UnknownConditional {
        owner: String,
        flag: String,
        detail: String,
    },

    /// A target resolved to no modules.
    #[error("Target '{target}' declares no modules")]
    EmptyTarget { target: String },

    /// The requested target is not active under the build context.
    #[error("Unknown target '{target}'{}", hint_suffix(hint))]
    UnknownTarget {
        target: String,
        hint: Option<String>,
    },

    /// Two descriptors of the same kind are active under the same name.
    #[error("Duplicate {kind} descriptor '{name}'")]
    DuplicateDescriptor { kind: String, name: String },

    /// A descriptor violates a structural rule (name syntax, PCH settings,
    /// context flag declarations).
    #[error("Invalid descriptor '{name}': {message}")]
    InvalidDescriptor { name: String, message: String },

    /// A descriptor document could not be understood.
    #[error("Configuration parsing error: {message}{}", hint_suffix(hint))]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An invalid `include:` glob pattern.
    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// A path matched by an `include:` pattern could not be read.
    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// Directory discovery failed.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A plan could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Whether this error is a defect in the descriptors themselves, as
    /// opposed to an unreadable or unparsable input.
    pub fn is_descriptor_defect(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedReference { .. }
                | Error::CyclicDependency { .. }
                | Error::UnknownConditional { .. }
                | Error::EmptyTarget { .. }
                | Error::UnknownTarget { .. }
                | Error::DuplicateDescriptor { .. }
                | Error::InvalidDescriptor { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
