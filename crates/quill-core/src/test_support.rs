//! Filesystem fixtures for unit tests.

use crate::config::DEFAULT_METADATA_FILE;
use crate::metadata::MetadataTree;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub(crate) struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// A small project:
    ///
    /// ```text
    /// contents/ch1.md   explicit ref to settings/world.md, several link spellings
    /// contents/ch2.md   links to hero, external links, a broken link
    /// settings/world.md links down to characters/hero.md
    /// settings/x.md
    /// settings/characters/hero.md links back up to world.md
    /// ```
    pub fn sample() -> Self {
        let fx = Self::new();
        fx.meta(
            "",
            "files:\n  - name: contents\n    type: subdirectory\n  - name: settings\n    type: subdirectory\n",
        );
        fx.meta(
            "contents",
            "files:\n  - name: ch1.md\n    type: content\n    references:\n      - settings/world.md\n  - name: ch2.md\n    type: content\n",
        );
        fx.meta(
            "settings",
            "files:\n  - name: world.md\n    type: setting\n  - name: x.md\n    type: setting\n  - name: characters\n    type: subdirectory\n",
        );
        fx.meta(
            "settings/characters",
            "files:\n  - name: hero.md\n    type: setting\n    tags: [main]\n",
        );
        fx.file(
            "contents/ch1.md",
            "Intro [a](settings/x.md) and [b](../settings/x.md).\nSee [the world](../settings/world.md \"World\") or [web](https://example.com).\n",
        );
        fx.file(
            "contents/ch2.md",
            "*[hero](../settings/characters/hero.md)* [mail](mailto:a@b.com) [top](#top) [gone](nowhere.md)\n",
        );
        fx.file("settings/world.md", "The [hero](characters/hero.md) lives here.\n");
        fx.file("settings/x.md", "");
        fx.file("settings/characters/hero.md", "> Back to [world](../world.md)\n");
        fx
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tree(&self) -> MetadataTree {
        MetadataTree::new(self.root(), DEFAULT_METADATA_FILE)
    }

    /// Write the metadata record of `dir` ("" for the root).
    pub fn meta(&self, dir: &str, yaml: &str) {
        let dir_path = self.root().join(dir);
        fs::create_dir_all(&dir_path).unwrap();
        fs::write(dir_path.join(DEFAULT_METADATA_FILE), yaml).unwrap();
    }

    pub fn file(&self, path: &str, contents: &str) {
        let full = self.root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root().join(path)).unwrap()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.root().join(path).exists()
    }
}
