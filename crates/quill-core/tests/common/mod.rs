//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Builds a project tree inside a temp dir.
pub struct ProjectBuilder {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write the metadata record of `dir` ("" for the root).
    pub fn meta(&self, dir: &str, yaml: &str) -> &Self {
        let path = self.root().join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(".quill-meta.yaml"), yaml).unwrap();
        self
    }

    pub fn file(&self, path: &str, contents: &str) -> &Self {
        let full = self.root().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
        self
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root().join(path)).unwrap()
    }
}

/// A novel with chapters and settings that reference each other in every
/// supported spelling.
///
/// ```text
/// contents/ch1.md   -> settings/world.md (relative, titled), settings/x.md (root-relative)
/// contents/ch2.md   -> settings/world.md (leading slash, fragment)
/// settings/world.md -> ./x.md
/// settings/x.md     -> world.md
/// ```
#[allow(dead_code)]
pub fn novel() -> ProjectBuilder {
    let p = ProjectBuilder::new();
    p.meta(
        "",
        "readme: README.md\nfiles:\n  - name: contents\n    type: subdirectory\n  - name: settings\n    type: subdirectory\n",
    )
    .meta(
        "contents",
        "files:\n  - name: ch1.md\n    type: content\n    references: [settings/world.md]\n    tags: [draft]\n  - name: ch2.md\n    type: content\n",
    )
    .meta(
        "settings",
        "files:\n  - name: world.md\n    type: setting\n    references: [./settings/x.md]\n  - name: x.md\n    type: setting\n",
    )
    .file(
        "contents/ch1.md",
        "# Chapter 1\n\nThe [old world](../settings/world.md \"World notes\") and [x](settings/x.md).\n",
    )
    .file(
        "contents/ch2.md",
        "# Chapter 2\n\nBack to [geography](/settings/world.md#geography), see [site](https://example.com).\n",
    )
    .file("settings/world.md", "World, with [x](./x.md).\n")
    .file("settings/x.md", "X, part of [the world](world.md).\n");
    p
}
