//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and descriptor snippets to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(descriptors::ORIGINAL_GAME);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use std::path::Path;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::descriptors;
    pub use super::TestFixture;
}

/// Descriptor documents shared by the tests.
#[allow(dead_code)]
pub mod descriptors {
    /// A game module with an editor-only dependency block, its editor
    /// module, and one target per kind and engine era.
    pub const ORIGINAL_GAME: &str = r#"
context:
  editor: { type: bool }
  engine: { type: enum, values: ["5.1", "5.4"], default: "5.4" }
modules:
  - name: Core
    public_include_paths: [Runtime/Core/Public]
  - name: CoreUObject
    public_include_paths: [Runtime/CoreUObject/Public]
    public_dependencies: [Core]
  - name: Engine
    public_include_paths: [Runtime/Engine/Public]
    public_dependencies: [Core, CoreUObject]
  - name: Slate
    public_include_paths: [Runtime/Slate/Public]
    public_dependencies: [Core]
  - name: UMG
    public_include_paths: [Runtime/UMG/Public]
    public_dependencies: [Slate]
  - name: UnrealEd
    when: { editor: true }
    public_include_paths: [Editor/UnrealEd/Public]
    public_dependencies: [Engine]
  - name: AnimGraph
    when: { editor: true }
    public_include_paths: [Editor/AnimGraph/Public]
    public_dependencies: [Engine]
  - name: OriginalGame
    pch: UseExplicitOrShared
    public_include_paths: [OriginalGame]
    public_dependencies: [Core, CoreUObject, Engine]
    private_dependencies: [Slate, UMG]
    conditionals:
      - when: { editor: true }
        public_dependencies: [UnrealEd, AnimGraph]
  - name: OriginalGameEditor
    when: { editor: true }
    public_include_paths: [OriginalGameEditor]
    public_dependencies: [OriginalGame, UnrealEd]
targets:
  - name: OriginalGame
    kind: Game
    when: { engine: "5.1" }
    build_settings: V2
    include_order: Unreal5_1
    extra_modules: [OriginalGame]
  - name: OriginalGame
    kind: Game
    when: { engine: "5.4" }
    build_settings: V5
    include_order: Unreal5_4
    extra_modules: [OriginalGame]
  - name: OriginalGameEditor
    kind: Editor
    when: { editor: true }
    build_settings: V2
    include_order: Unreal5_1
    extra_modules: [OriginalGame, OriginalGameEditor]
"#;

    /// Two modules depending on each other.
    pub const CYCLE: &str = r#"
modules:
  - name: A
    public_dependencies: [B]
  - name: B
    private_dependencies: [A]
targets:
  - name: Game
    kind: Game
    extra_modules: [A]
"#;

    /// A module naming a dependency nobody declares.
    pub const UNRESOLVED: &str = r#"
modules:
  - name: Engine
  - name: Game
    public_dependencies: [Engien]
targets:
  - name: Game
    kind: Game
    extra_modules: [Game]
"#;

    /// Syntactically broken YAML.
    pub const INVALID_YAML: &str = "modules: [unclosed\n";
}

/// A test fixture that provides a temporary directory with optional
/// descriptors.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `buildplan.yaml` descriptor file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("buildplan.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the descriptor file.
    #[allow(dead_code)]
    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("buildplan.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("buildplan");
        cmd.current_dir(self.path())
            .env_remove("BUILDPLAN_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
