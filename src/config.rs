//! # Descriptor Schema and Loading
//!
//! This module defines the records that make up a descriptor document and the
//! logic for reading them from disk. A document has four optional sections:
//!
//! ```yaml
//! context:            # flags the descriptors may reference
//!   editor: { type: bool }
//!   engine: { type: enum, values: ["5.1", "5.4"], default: "5.4" }
//! include:            # more descriptor files, globbed relative to this one
//!   - "Source/**/*.build.yaml"
//! modules:
//!   - name: OriginalGame
//!     pch: UseExplicitOrShared
//!     public_include_paths: [OriginalGame]
//!     public_dependencies: [Core, Engine]
//!     private_dependencies: [Slate]
//!     conditionals:
//!       - when: { editor: true }
//!         public_dependencies: [UnrealEd]
//! targets:
//!   - name: OriginalGame
//!     kind: Game
//!     build_settings: V2
//!     include_order: Unreal5_1
//!     extra_modules: [OriginalGame]
//!     when: { engine: "5.1" }
//! ```
//!
//! ## Formats
//!
//! YAML (`.yaml`/`.yml`), JSON (`.json`) and TOML (`.toml`) documents share
//! the same schema. Unknown keys are rejected so that a misspelt field is an
//! error rather than a silently ignored dependency list.
//!
//! ## Loading
//!
//! - [`from_file`] reads one document and follows its `include:` patterns.
//! - [`from_path`] accepts either a file or a directory; a directory is
//!   walked for `*.build.{yaml,yml,json,toml}` fragments, one per module
//!   directory, the way a source tree keeps one build file next to each
//!   module.
//!
//! All loaders merge documents in a deterministic order (sorted paths).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::context::{Condition, ContextSchema};
use crate::error::{Error, Result};

/// Suffixes recognised when discovering fragments in a directory.
pub const FRAGMENT_SUFFIXES: &[&str] = &[".build.yaml", ".build.yml", ".build.json", ".build.toml"];

/// Default descriptor file looked up by the CLI.
pub const DEFAULT_CONFIG_FILENAME: &str = "buildplan.yaml";

/// Precompiled header policy of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PchPolicy {
    /// No precompiled header.
    #[serde(rename = "None")]
    NoPch,
    /// Use the module's own header if it has one, a shared one otherwise.
    #[default]
    UseExplicitOrShared,
    /// Use only the module's own `private_pch_header`.
    UseExplicit,
    /// Use only a shared precompiled header.
    UseShared,
}

/// Kind of build output a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Game,
    Editor,
    Client,
    Server,
}

/// Default build settings generation a target opts into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildSettingsVersion {
    V1,
    V2,
    V3,
    V4,
    V5,
    #[default]
    Latest,
}

/// Engine include order generation a target compiles against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncludeOrderVersion {
    Unreal5_0,
    Unreal5_1,
    Unreal5_2,
    Unreal5_3,
    Unreal5_4,
    #[default]
    Latest,
}

/// Additions to a module applied when `when` matches the build context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConditional {
    pub when: Condition,
    #[serde(default)]
    pub public_dependencies: Vec<String>,
    #[serde(default)]
    pub private_dependencies: Vec<String>,
    #[serde(default)]
    pub public_include_paths: Vec<String>,
    #[serde(default)]
    pub private_include_paths: Vec<String>,
    #[serde(default)]
    pub public_definitions: Vec<String>,
    #[serde(default)]
    pub private_definitions: Vec<String>,
}

/// A compilation unit: its include paths, definitions and dependencies.
///
/// Dependencies are listed by module name and resolved against the active
/// descriptor set, never held by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
    pub name: String,
    /// Selects this descriptor as a whole. Absent means always active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default)]
    pub pch: PchPolicy,
    /// Header used when `pch` is `UseExplicit` or `UseExplicitOrShared`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_pch_header: Option<String>,
    /// Re-exported to every module depending on this one.
    #[serde(default)]
    pub public_dependencies: Vec<String>,
    /// Visible to this module's own compilation only.
    #[serde(default)]
    pub private_dependencies: Vec<String>,
    #[serde(default)]
    pub public_include_paths: Vec<String>,
    #[serde(default)]
    pub private_include_paths: Vec<String>,
    #[serde(default)]
    pub public_definitions: Vec<String>,
    #[serde(default)]
    pub private_definitions: Vec<String>,
    #[serde(default)]
    pub conditionals: Vec<ModuleConditional>,
}

/// Additions to a target applied when `when` matches the build context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConditional {
    pub when: Condition,
    #[serde(default)]
    pub extra_modules: Vec<String>,
    #[serde(default)]
    pub definitions: Vec<String>,
}

/// A top-level build output composed of modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDescriptor {
    pub name: String,
    pub kind: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default)]
    pub build_settings: BuildSettingsVersion,
    #[serde(default)]
    pub include_order: IncludeOrderVersion,
    /// Root modules of the target, in the order they are planned.
    #[serde(default)]
    pub extra_modules: Vec<String>,
    /// Target-wide compile definitions.
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub conditionals: Vec<TargetConditional>,
}

/// One descriptor document, before any `include:` is followed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorFile {
    #[serde(default)]
    pub context: ContextSchema,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    #[serde(default)]
    pub targets: Vec<TargetDescriptor>,
}

/// Everything loaded for a session: the merge of all documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    pub context: ContextSchema,
    pub modules: Vec<ModuleDescriptor>,
    pub targets: Vec<TargetDescriptor>,
    /// Files the set was read from, in load order.
    pub sources: Vec<PathBuf>,
}

impl DescriptorSet {
    /// Appends a document. Flags may be declared by several documents as
    /// long as the declarations agree.
    pub fn merge(&mut self, file: DescriptorFile) -> Result<()> {
        for (flag, spec) in file.context {
            match self.context.get(&flag) {
                Some(existing) if *existing != spec => {
                    return Err(Error::ConfigParse {
                        message: format!("Context flag '{}' is declared twice with different types", flag),
                        hint: Some("Declare each context flag once, or identically".to_string()),
                    });
                }
                Some(_) => {}
                None => {
                    self.context.insert(flag, spec);
                }
            }
        }
        self.modules.extend(file.modules);
        self.targets.extend(file.targets);
        Ok(())
    }
}

/// Document formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Picks the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(Error::ConfigParse {
                message: format!("Unsupported descriptor file: {}", path.display()),
                hint: Some("Use a .yaml, .yml, .json or .toml extension".to_string()),
            }),
        }
    }
}

/// Parses one document in the given format.
pub fn parse(content: &str, format: Format) -> Result<DescriptorFile> {
    let parsed = match format {
        Format::Yaml => {
            // An empty or comment-only file is an empty document.
            if content.trim().lines().all(|l| l.trim_start().starts_with('#') || l.trim().is_empty()) {
                return Ok(DescriptorFile::default());
            }
            serde_yaml::from_str(content).map_err(Error::Yaml)
        }
        Format::Json => serde_json::from_str(content).map_err(Error::Json),
        Format::Toml => toml::from_str(content).map_err(Error::Toml),
    };
    parsed.map_err(with_field_hint)
}

/// Parses a YAML document; the format most descriptor sets use.
pub fn parse_yaml(content: &str) -> Result<DescriptorFile> {
    parse(content, Format::Yaml)
}

/// Turns "unknown field" deserializer errors into a hinted `ConfigParse`.
fn with_field_hint(error: Error) -> Error {
    let message = error.to_string();
    if !message.contains("unknown field") {
        return error;
    }
    let hint = ["public_deps", "private_deps", "deps", "dependencies"]
        .iter()
        .find(|alias| message.contains(&format!("`{}`", alias)))
        .map(|_| "Dependencies are listed under 'public_dependencies' and 'private_dependencies'")
        .unwrap_or("Check the field name against the descriptor schema");
    Error::ConfigParse {
        message,
        hint: Some(hint.to_string()),
    }
}

/// Loads a descriptor file and everything it includes.
pub fn from_file(path: &Path) -> Result<DescriptorSet> {
    let mut set = DescriptorSet::default();
    let mut seen = HashSet::new();
    load_into(path, &mut set, &mut seen)?;
    Ok(set)
}

/// Loads descriptors from a file, or from every fragment under a directory.
pub fn from_path(path: &Path) -> Result<DescriptorSet> {
    if !path.is_dir() {
        return from_file(path);
    }

    let mut fragments = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if FRAGMENT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            fragments.push(entry.into_path());
        }
    }
    fragments.sort();

    if fragments.is_empty() {
        warn!("No descriptor fragments found under {}", path.display());
    }

    let mut set = DescriptorSet::default();
    let mut seen = HashSet::new();
    for fragment in fragments {
        load_into(&fragment, &mut set, &mut seen)?;
    }
    Ok(set)
}

fn load_into(path: &Path, set: &mut DescriptorSet, seen: &mut HashSet<PathBuf>) -> Result<()> {
    let canonical = path.canonicalize()?;
    if !seen.insert(canonical.clone()) {
        debug!("Skipping already loaded {}", path.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    let file = parse(&content, Format::from_path(path)?).map_err(|e| match e {
        Error::ConfigParse { message, hint } => Error::ConfigParse {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        other => other,
    })?;
    debug!(
        "Loaded {} ({} modules, {} targets)",
        path.display(),
        file.modules.len(),
        file.targets.len()
    );

    let includes = file.include.clone();
    set.merge(file)?;
    set.sources.push(canonical.clone());

    // Only the include entry is a pattern; the directory it is relative to
    // is matched literally.
    let base = canonical
        .parent()
        .map(|dir| glob::Pattern::escape(&dir.to_string_lossy()))
        .unwrap_or_default();
    for pattern in &includes {
        let full = Path::new(&base).join(pattern);
        let mut matched: Vec<PathBuf> = glob::glob(&full.to_string_lossy())?
            .collect::<std::result::Result<_, _>>()?;
        matched.sort();
        if matched.is_empty() {
            warn!("Include pattern '{}' in {} matched nothing", pattern, path.display());
        }
        for included in matched {
            load_into(&included, set, seen)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FlagSpec;
    use tempfile::TempDir;

    const ORIGINAL_GAME: &str = r#"
context:
  editor: { type: bool }
modules:
  - name: OriginalGame
    pch: UseExplicitOrShared
    public_include_paths: [OriginalGame]
    public_dependencies: [Core, CoreUObject, Engine]
    private_dependencies: [Slate, UMG]
    conditionals:
      - when: { editor: true }
        public_dependencies: [UnrealEd, AnimGraph]
targets:
  - name: OriginalGameEditor
    kind: Editor
    build_settings: V2
    include_order: Unreal5_1
    extra_modules: [OriginalGame]
"#;

    #[test]
    fn test_parse_module_and_target() {
        let file = parse_yaml(ORIGINAL_GAME).unwrap();
        assert_eq!(file.modules.len(), 1);
        let module = &file.modules[0];
        assert_eq!(module.name, "OriginalGame");
        assert_eq!(module.pch, PchPolicy::UseExplicitOrShared);
        assert_eq!(module.public_dependencies, vec!["Core", "CoreUObject", "Engine"]);
        assert_eq!(module.conditionals.len(), 1);
        assert_eq!(
            module.conditionals[0].public_dependencies,
            vec!["UnrealEd", "AnimGraph"]
        );

        let target = &file.targets[0];
        assert_eq!(target.kind, TargetKind::Editor);
        assert_eq!(target.build_settings, BuildSettingsVersion::V2);
        assert_eq!(target.include_order, IncludeOrderVersion::Unreal5_1);
        assert_eq!(file.context.get("editor"), Some(&FlagSpec::Bool { default: false }));
    }

    #[test]
    fn test_defaults() {
        let file = parse_yaml("modules:\n  - name: Core\n").unwrap();
        let module = &file.modules[0];
        assert_eq!(module.pch, PchPolicy::UseExplicitOrShared);
        assert!(module.when.is_none());
        assert!(module.public_dependencies.is_empty());

        let file = parse_yaml("targets:\n  - name: T\n    kind: Game\n").unwrap();
        assert_eq!(file.targets[0].build_settings, BuildSettingsVersion::Latest);
        assert_eq!(file.targets[0].include_order, IncludeOrderVersion::Latest);
    }

    #[test]
    fn test_pch_none_spelling() {
        let file = parse_yaml("modules:\n  - name: Core\n    pch: None\n").unwrap();
        assert_eq!(file.modules[0].pch, PchPolicy::NoPch);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_yaml("").unwrap(), DescriptorFile::default());
        assert_eq!(parse_yaml("# nothing yet\n").unwrap(), DescriptorFile::default());
    }

    #[test]
    fn test_unknown_field_is_rejected_with_hint() {
        let err = parse_yaml("modules:\n  - name: Game\n    public_deps: [Core]\n").unwrap_err();
        match err {
            Error::ConfigParse { message, hint } => {
                assert!(message.contains("public_deps"));
                assert!(hint.unwrap().contains("public_dependencies"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = r#"{"modules": [{"name": "Core", "public_include_paths": ["Core/Public"]}]}"#;
        let file = parse(json, Format::Json).unwrap();
        assert_eq!(file.modules[0].public_include_paths, vec!["Core/Public"]);

        let toml = r#"
[[modules]]
name = "Engine"
public_dependencies = ["Core"]

[[targets]]
name = "Game"
kind = "Game"
extra_modules = ["Engine"]
"#;
        let file = parse(toml, Format::Toml).unwrap();
        assert_eq!(file.modules[0].public_dependencies, vec!["Core"]);
        assert_eq!(file.targets[0].kind, TargetKind::Game);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.yml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.toml")).unwrap(), Format::Toml);
        assert!(Format::from_path(Path::new("Game.Build.cs")).is_err());
    }

    #[test]
    fn test_merge_rejects_conflicting_flags() {
        let mut set = DescriptorSet::default();
        set.merge(parse_yaml("context:\n  editor: { type: bool }\n").unwrap())
            .unwrap();
        set.merge(parse_yaml("context:\n  editor: { type: bool }\n").unwrap())
            .unwrap();
        let err = set
            .merge(parse_yaml("context:\n  editor: { type: enum, values: [on] }\n").unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_from_file_follows_includes() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Source/Engine")).unwrap();
        std::fs::write(
            temp.path().join("buildplan.yaml"),
            "include: [\"Source/**/*.build.yaml\"]\nmodules:\n  - name: Game\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("Source/Engine/Engine.build.yaml"),
            "modules:\n  - name: Engine\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("Source/Core.build.yaml"),
            "modules:\n  - name: Core\n",
        )
        .unwrap();

        let set = from_file(&temp.path().join("buildplan.yaml")).unwrap();
        let names: Vec<&str> = set.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Game", "Core", "Engine"]);
        assert_eq!(set.sources.len(), 3);
    }

    #[test]
    fn test_include_cycle_loads_each_file_once() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("a.yaml"),
            "include: [b.yaml]\nmodules:\n  - name: A\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("b.yaml"),
            "include: [a.yaml]\nmodules:\n  - name: B\n",
        )
        .unwrap();

        let set = from_file(&temp.path().join("a.yaml")).unwrap();
        assert_eq!(set.modules.len(), 2);
    }

    #[test]
    fn test_from_path_discovers_fragments() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Game")).unwrap();
        std::fs::write(
            temp.path().join("Game/Game.build.yaml"),
            "modules:\n  - name: Game\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("Core.build.json"),
            r#"{"modules": [{"name": "Core"}]}"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("notes.yaml"), "not: a fragment\n").unwrap();

        let set = from_path(temp.path()).unwrap();
        let names: Vec<&str> = set.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Core", "Game"]);
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file(Path::new("/nonexistent/buildplan.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
