use crate::link_parser::{apply_edits, compute_link_rewrite_edits};
use crate::metadata::{FileKind, MetadataTree, ProjectFile};
use crate::path_resolver::{
    is_within, normalize_path, relative_link, PathMove, PathResolver, ResolutionStrategy,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Outcome of one link update sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdateResult {
    /// True iff no file failed.
    pub success: bool,
    pub message: String,
    /// Documents and metadata records with at least one rewrite.
    pub updated_files: Vec<String>,
    pub failed_files: Vec<FailedFile>,
    /// Every document and metadata record examined.
    pub total_scanned_files: usize,
}

impl LinkUpdateResult {
    fn fail(path: &str, error: impl ToString) -> Self {
        Self {
            success: false,
            message: format!("Link update aborted: {}", error.to_string()),
            failed_files: vec![FailedFile {
                path: path.to_string(),
                error: error.to_string(),
            }],
            ..Default::default()
        }
    }

    fn finish(mut self) -> Self {
        self.success = self.failed_files.is_empty();
        self.message = if self.success {
            format!(
                "Updated links in {} of {} scanned files",
                self.updated_files.len(),
                self.total_scanned_files
            )
        } else {
            format!(
                "Updated links in {} of {} scanned files, {} failed",
                self.updated_files.len(),
                self.total_scanned_files,
                self.failed_files.len()
            )
        };
        self
    }
}

/// Rewrites hyperlinks and explicit references after files move.
///
/// The metadata may or may not already reflect the move: links are resolved
/// against the pre-move view either way.
pub struct LinkUpdater<'a> {
    tree: &'a MetadataTree,
    rewrite_outgoing: bool,
}

impl<'a> LinkUpdater<'a> {
    pub fn new(tree: &'a MetadataTree) -> Self {
        Self {
            tree,
            rewrite_outgoing: true,
        }
    }

    /// Whether a moved document's own relative links are re-spelled from its
    /// new location.
    pub fn rewrite_outgoing(mut self, enabled: bool) -> Self {
        self.rewrite_outgoing = enabled;
        self
    }

    /// Single file rename or move.
    pub fn update_links_after_file_operation(&self, old_path: &str, new_path: &str) -> LinkUpdateResult {
        let (Some(old), Some(new)) = (normalize_path(old_path), normalize_path(new_path)) else {
            let bad = if normalize_path(old_path).is_none() { old_path } else { new_path };
            return LinkUpdateResult::fail(bad, "not a valid project path");
        };
        self.update_links_for_moves(&[PathMove::new(old, new)])
    }

    /// Move of a whole directory: every file in the subtree is rewritten in one sweep.
    pub fn update_links_after_directory_move(&self, old_dir: &str, new_dir: &str) -> LinkUpdateResult {
        let (Some(old_dir), Some(new_dir)) = (normalize_path(old_dir), normalize_path(new_dir)) else {
            return LinkUpdateResult::fail(old_dir, "not a valid project directory");
        };
        let files = match self.tree.enumerate() {
            Ok(files) => files,
            Err(e) => return LinkUpdateResult::fail(&self.tree.record_path(""), e),
        };
        let moves = directory_moves(&files, &old_dir, &new_dir);
        tracing::info!(
            "Directory move {} -> {} covers {} paths",
            old_dir,
            new_dir,
            moves.len()
        );
        self.sweep(&files, &moves)
    }

    /// Apply any set of moves in one sweep over the project.
    pub fn update_links_for_moves(&self, moves: &[PathMove]) -> LinkUpdateResult {
        let files = match self.tree.enumerate() {
            Ok(files) => files,
            Err(e) => return LinkUpdateResult::fail(&self.tree.record_path(""), e),
        };
        self.sweep(&files, moves)
    }

    fn sweep(&self, files: &[ProjectFile], moves: &[PathMove]) -> LinkUpdateResult {
        let started = Instant::now();
        // Subdirectories are never link targets.
        let directories: HashSet<&str> = files
            .iter()
            .filter(|f| f.kind == FileKind::Subdirectory)
            .map(|f| f.path.as_str())
            .collect();
        let moves: Vec<PathMove> = moves
            .iter()
            .filter(|m| m.old != m.new)
            .filter(|m| !directories.contains(m.old.as_str()) && !directories.contains(m.new.as_str()))
            .cloned()
            .collect();
        if moves.is_empty() {
            return LinkUpdateResult {
                success: true,
                message: "Nothing moved, no links to update".to_string(),
                ..Default::default()
            };
        }

        let resolver = PathResolver::from_files(files);
        let pre_move = resolver.before_moves(&moves);
        let post_move = resolver.after_moves(&moves);
        let forward: HashMap<&str, &str> = moves.iter().map(|m| (m.old.as_str(), m.new.as_str())).collect();
        let backward: HashMap<&str, &str> = moves.iter().map(|m| (m.new.as_str(), m.old.as_str())).collect();

        let mut result = LinkUpdateResult::default();

        // Documents
        for file in files.iter().filter(|f| f.kind.is_document()) {
            result.total_scanned_files += 1;

            // origin: where the links were written; current: where the file lives after the move.
            let (origin, current) = if let Some(old) = backward.get(file.path.as_str()) {
                (old.to_string(), file.path.clone())
            } else if let Some(new) = forward.get(file.path.as_str()) {
                (file.path.clone(), new.to_string())
            } else {
                (file.path.clone(), file.path.clone())
            };
            let self_moved = origin != current;

            // Metadata may still list a file that has already moved on disk.
            let mut location = file.path.as_str();
            let mut full_path = self.tree.absolute(location);
            let mut read = fs::read_to_string(&full_path);
            if self_moved && location == origin && matches!(&read, Err(e) if e.kind() == ErrorKind::NotFound) {
                location = current.as_str();
                full_path = self.tree.absolute(location);
                read = fs::read_to_string(&full_path);
            }
            let text = match read {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Cannot read {} for link update: {}", location, e);
                    result.failed_files.push(FailedFile {
                        path: location.to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let edits = compute_link_rewrite_edits(&text, |link| {
                let resolution = pre_move.resolve(&link.target, &origin)?;
                match forward.get(resolution.path.as_str()) {
                    Some(new_target) => Some(spell_unambiguous(
                        &post_move,
                        link.path(),
                        resolution.strategy,
                        &current,
                        new_target,
                    )),
                    None if self_moved
                        && self.rewrite_outgoing
                        && resolution.strategy == ResolutionStrategy::OriginRelative =>
                    {
                        Some(spell_unambiguous(
                            &post_move,
                            link.path(),
                            resolution.strategy,
                            &current,
                            &resolution.path,
                        ))
                    }
                    None => None,
                }
            });
            if edits.is_empty() {
                continue;
            }

            let rewritten = apply_edits(&text, &edits);
            match fs::write(&full_path, rewritten) {
                Ok(()) => {
                    tracing::debug!("Rewrote {} links in {}", edits.len(), location);
                    result.updated_files.push(location.to_string());
                }
                Err(e) => {
                    tracing::error!("Failed to write {}: {}", location, e);
                    result.failed_files.push(FailedFile {
                        path: location.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // Metadata records
        for dir in MetadataTree::directories(files) {
            let record_path = self.tree.record_path(&dir);
            let mut record = match self.tree.load_record(&dir) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Cannot read {} for reference update: {}", record_path, e);
                    result.total_scanned_files += 1;
                    result.failed_files.push(FailedFile {
                        path: record_path,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            result.total_scanned_files += 1;

            let mut changed = 0usize;
            for entry in &mut record.files {
                let Some(references) = entry.references.as_mut() else {
                    continue;
                };
                for reference in references.iter_mut() {
                    let Some(canonical) = normalize_path(reference) else {
                        continue;
                    };
                    if let Some(new) = forward.get(canonical.as_str()) {
                        *reference = new.to_string();
                        changed += 1;
                    }
                }
            }
            if changed == 0 {
                continue;
            }

            match self.tree.save_record(&dir, &record) {
                Ok(()) => {
                    tracing::debug!("Rewrote {} references in {}", changed, record_path);
                    result.updated_files.push(record_path);
                }
                Err(e) => {
                    tracing::error!("Failed to write {}: {}", record_path, e);
                    result.failed_files.push(FailedFile {
                        path: record_path,
                        error: e.to_string(),
                    });
                }
            }
        }

        let result = result.finish();
        tracing::info!("{} ({} moves, {:?})", result.message, moves.len(), started.elapsed());
        result
    }
}

/// Old/new pairs for every tracked file under a moved directory. Works whether
/// the metadata lists the subtree under the old or the new directory.
fn directory_moves(files: &[ProjectFile], old_dir: &str, new_dir: &str) -> Vec<PathMove> {
    let remap = |path: &str, from: &str, to: &str| format!("{}{}", to, &path[from.len()..]);
    let files: Vec<&ProjectFile> = files.iter().filter(|f| f.kind != FileKind::Subdirectory).collect();

    let forward: Vec<PathMove> = files
        .iter()
        .filter(|f| is_within(&f.path, old_dir))
        .map(|f| PathMove::new(f.path.clone(), remap(&f.path, old_dir, new_dir)))
        .collect();
    if !forward.is_empty() {
        return forward;
    }
    files
        .iter()
        .filter(|f| is_within(&f.path, new_dir))
        .map(|f| PathMove::new(remap(&f.path, new_dir, old_dir), f.path.clone()))
        .collect()
}

/// Spell a link to `target` from a document living at `document`, following
/// the convention of the link it replaces.
fn spell_link(original: &str, strategy: ResolutionStrategy, document: &str, target: &str) -> String {
    let spelled = match strategy {
        ResolutionStrategy::OriginRelative => {
            let rel = relative_link(document, target);
            if original.starts_with("./") && !rel.starts_with("../") {
                format!("./{}", rel)
            } else {
                rel
            }
        }
        ResolutionStrategy::RootRelative => {
            if original.starts_with('/') {
                format!("/{}", target)
            } else {
                target.to_string()
            }
        }
    };
    // Link targets cannot contain whitespace.
    spelled.replace(' ', "%20")
}

/// `spell_link`, falling back to a root-anchored link when the preferred
/// spelling would resolve to some other file after the move.
fn spell_unambiguous(
    post_move: &PathResolver,
    original: &str,
    strategy: ResolutionStrategy,
    document: &str,
    target: &str,
) -> String {
    let spelled = spell_link(original, strategy, document, target);
    if post_move.resolve_canonical(&spelled, document).as_deref() == Some(target) {
        return spelled;
    }
    tracing::debug!("{} from {} is ambiguous, anchoring at the root", spelled, document);
    format!("/{}", target.replace(' ', "%20"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use std::fs;

    fn rename(fx: &Fixture, old: &str, new: &str) -> LinkUpdateResult {
        let tree = fx.tree();
        LinkUpdater::new(&tree).update_links_after_file_operation(old, new)
    }

    // === spelling ===

    #[test]
    fn spell_relative_keeps_dot_slash() {
        assert_eq!(
            spell_link("./x.md", ResolutionStrategy::OriginRelative, "settings/world.md", "settings/y.md"),
            "./y.md"
        );
        assert_eq!(
            spell_link("./x.md", ResolutionStrategy::OriginRelative, "settings/world.md", "contents/y.md"),
            "../contents/y.md"
        );
    }

    #[test]
    fn spell_root_relative_keeps_leading_slash() {
        assert_eq!(
            spell_link("/settings/x.md", ResolutionStrategy::RootRelative, "contents/ch1.md", "notes/x.md"),
            "/notes/x.md"
        );
        assert_eq!(
            spell_link("settings/x.md", ResolutionStrategy::RootRelative, "contents/ch1.md", "notes/x.md"),
            "notes/x.md"
        );
    }

    #[test]
    fn spell_encodes_spaces() {
        assert_eq!(
            spell_link("x.md", ResolutionStrategy::RootRelative, "a.md", "my notes/x y.md"),
            "my%20notes/x%20y.md"
        );
    }

    // === file rename ===

    #[test]
    fn rename_rewrites_documents_and_metadata() {
        let fx = Fixture::sample();
        let result = rename(&fx, "settings/world.md", "settings/world-setting.md");

        assert!(result.success, "{:?}", result);
        assert_eq!(
            fx.read("contents/ch1.md"),
            "Intro [a](settings/x.md) and [b](../settings/x.md).\nSee [the world](../settings/world-setting.md \"World\") or [web](https://example.com).\n"
        );
        assert_eq!(fx.read("settings/characters/hero.md"), "> Back to [world](../world-setting.md)\n");
        assert!(fx.read("contents/.quill-meta.yaml").contains("settings/world-setting.md"));

        assert_eq!(
            result.updated_files,
            vec![
                "contents/ch1.md",
                "settings/characters/hero.md",
                "contents/.quill-meta.yaml",
            ]
        );
        // 5 documents + 4 records
        assert_eq!(result.total_scanned_files, 9);
    }

    #[test]
    fn rename_after_metadata_already_updated() {
        let fx = Fixture::sample();
        fs::rename(fx.root().join("settings/world.md"), fx.root().join("settings/world-setting.md")).unwrap();
        fx.meta(
            "settings",
            "files:\n  - name: world-setting.md\n    type: setting\n  - name: x.md\n    type: setting\n  - name: characters\n    type: subdirectory\n",
        );
        let result = rename(&fx, "settings/world.md", "settings/world-setting.md");

        assert!(result.success);
        assert_eq!(fx.read("settings/characters/hero.md"), "> Back to [world](../world-setting.md)\n");
        assert!(fx.read("contents/ch1.md").contains("(../settings/world-setting.md \"World\")"));
    }

    #[test]
    fn unrelated_links_stay_byte_identical() {
        let fx = Fixture::sample();
        let ch2_before = fx.read("contents/ch2.md");
        let world_before = fx.read("settings/world.md");
        rename(&fx, "settings/world.md", "settings/world-setting.md");
        assert_eq!(fx.read("contents/ch2.md"), ch2_before);
        assert_eq!(fx.read("settings/world.md"), world_before);
    }

    #[test]
    fn root_relative_spelling_is_kept() {
        let fx = Fixture::sample();
        fx.file("contents/ch2.md", "[x](/settings/x.md) [y](settings/x.md#top) [z](../settings/x.md)");
        rename(&fx, "settings/x.md", "notes/x.md");
        assert_eq!(
            fx.read("contents/ch2.md"),
            "[x](/notes/x.md) [y](notes/x.md#top) [z](../notes/x.md)"
        );
    }

    #[test]
    fn dot_slash_spelling_is_kept() {
        let fx = Fixture::sample();
        fx.file("settings/world.md", "[x](./x.md \"X\")");
        rename(&fx, "settings/x.md", "settings/y.md");
        assert_eq!(fx.read("settings/world.md"), "[x](./y.md \"X\")");
    }

    #[test]
    fn noop_rename_changes_nothing() {
        let fx = Fixture::sample();
        let before = fx.read("contents/ch1.md");
        let result = rename(&fx, "settings/world.md", "./settings/world.md");
        assert!(result.success);
        assert!(result.updated_files.is_empty());
        assert_eq!(fx.read("contents/ch1.md"), before);
    }

    #[test]
    fn invalid_path_is_reported() {
        let fx = Fixture::sample();
        let result = rename(&fx, "../outside.md", "x.md");
        assert!(!result.success);
        assert_eq!(result.failed_files[0].path, "../outside.md");
    }

    #[test]
    fn unreadable_document_does_not_abort_sweep() {
        let fx = Fixture::sample();
        fx.meta(
            "contents",
            "files:\n  - name: ghost.md\n    type: content\n  - name: ch1.md\n    type: content\n    references:\n      - settings/world.md\n  - name: ch2.md\n    type: content\n",
        );
        let result = rename(&fx, "settings/world.md", "settings/world-setting.md");

        assert!(!result.success);
        assert_eq!(result.failed_files.len(), 1);
        assert_eq!(result.failed_files[0].path, "contents/ghost.md");
        assert!(result.updated_files.contains(&"contents/ch1.md".to_string()));
        assert!(result.message.contains("failed"));
    }

    #[test]
    fn missing_root_record_fails_whole_sweep() {
        let fx = Fixture::new();
        let result = rename(&fx, "a.md", "b.md");
        assert!(!result.success);
        assert_eq!(result.total_scanned_files, 0);
        assert_eq!(result.failed_files[0].path, ".quill-meta.yaml");
    }

    // === moved document's own links ===

    #[test]
    fn moved_document_relinks_its_relative_links() {
        let fx = Fixture::sample();
        let result = rename(&fx, "contents/ch1.md", "archive/old/ch1.md");
        assert!(result.success);
        assert_eq!(
            fx.read("contents/ch1.md"),
            "Intro [a](settings/x.md) and [b](../../settings/x.md).\nSee [the world](../../settings/world.md \"World\") or [web](https://example.com).\n"
        );
    }

    #[test]
    fn outgoing_rewrite_can_be_disabled() {
        let fx = Fixture::sample();
        let before = fx.read("contents/ch1.md");
        let tree = fx.tree();
        let result = LinkUpdater::new(&tree)
            .rewrite_outgoing(false)
            .update_links_after_file_operation("contents/ch1.md", "archive/old/ch1.md");
        assert!(result.success);
        assert_eq!(fx.read("contents/ch1.md"), before);
    }

    // === directory move ===

    #[test]
    fn directory_move_rewrites_links_into_subtree() {
        let fx = Fixture::sample();
        fs::rename(fx.root().join("settings/characters"), fx.root().join("settings/people")).unwrap();
        fx.meta(
            "settings",
            "files:\n  - name: world.md\n    type: setting\n  - name: x.md\n    type: setting\n  - name: people\n    type: subdirectory\n",
        );
        let tree = fx.tree();
        let result = LinkUpdater::new(&tree).update_links_after_directory_move("settings/characters", "settings/people");

        assert!(result.success, "{:?}", result);
        assert_eq!(fx.read("settings/world.md"), "The [hero](people/hero.md) lives here.\n");
        assert!(fx.read("contents/ch2.md").starts_with("*[hero](../settings/people/hero.md)*"));
        // Same depth, so the moved file's own link is unchanged.
        assert_eq!(fx.read("settings/people/hero.md"), "> Back to [world](../world.md)\n");
        assert_eq!(result.updated_files, vec!["contents/ch2.md", "settings/world.md"]);
    }

    #[test]
    fn directory_moves_cover_files_only() {
        let files = vec![
            ProjectFile::new("settings", FileKind::Subdirectory),
            ProjectFile::new("settings/x.md", FileKind::Setting),
            ProjectFile::new("settings/characters", FileKind::Subdirectory),
            ProjectFile::new("settings/characters/hero.md", FileKind::Setting),
            ProjectFile::new("settings2/y.md", FileKind::Setting),
        ];
        let moves = directory_moves(&files, "settings", "lore");
        assert_eq!(
            moves,
            vec![
                PathMove::new("settings/x.md", "lore/x.md"),
                PathMove::new("settings/characters/hero.md", "lore/characters/hero.md"),
            ]
        );
    }

    #[test]
    fn directory_links_are_left_alone_on_directory_move() {
        let fx = Fixture::sample();
        fx.file("settings/world.md", "See [people](characters) and [hero](characters/hero.md).\n");
        let tree = fx.tree();
        let result = LinkUpdater::new(&tree).update_links_after_directory_move("settings/characters", "settings/people");

        assert!(result.success, "{:?}", result);
        assert_eq!(
            fx.read("settings/world.md"),
            "See [people](characters) and [hero](people/hero.md).\n"
        );
    }

    #[test]
    fn subdirectory_move_alone_is_a_noop() {
        let fx = Fixture::sample();
        let tree = fx.tree();
        let result = LinkUpdater::new(&tree)
            .update_links_for_moves(&[PathMove::new("settings/characters", "settings/people")]);
        assert!(result.success);
        assert!(result.updated_files.is_empty());
    }

    // === ambiguous spellings ===

    #[test]
    fn root_relative_link_is_anchored_when_a_neighbour_would_capture_it() {
        let fx = Fixture::sample();
        fx.meta(
            "contents",
            "files:\n  - name: ch1.md\n    type: content\n  - name: ch2.md\n    type: content\n  - name: notes\n    type: subdirectory\n",
        );
        fx.meta("contents/notes", "files:\n  - name: x.md\n    type: content\n");
        fx.file("contents/notes/x.md", "Local notes.\n");
        fx.file("contents/ch2.md", "[y](settings/x.md) [z](/settings/x.md#top)\n");

        let result = rename(&fx, "settings/x.md", "notes/x.md");
        assert!(result.success, "{:?}", result);
        assert_eq!(fx.read("contents/ch2.md"), "[y](/notes/x.md) [z](/notes/x.md#top)\n");

        let resolver = PathResolver::new(["notes/x.md", "contents/notes/x.md", "contents/ch2.md"]);
        assert_eq!(
            resolver.resolve_canonical("/notes/x.md", "contents/ch2.md").as_deref(),
            Some("notes/x.md")
        );
    }

    #[test]
    fn unambiguous_spelling_is_preferred() {
        let post = PathResolver::new(["notes/x.md", "contents/ch2.md"]);
        assert_eq!(
            spell_unambiguous(&post, "settings/x.md", ResolutionStrategy::RootRelative, "contents/ch2.md", "notes/x.md"),
            "notes/x.md"
        );
        let post = PathResolver::new(["notes/x.md", "contents/notes/x.md", "contents/ch2.md"]);
        assert_eq!(
            spell_unambiguous(&post, "settings/x.md", ResolutionStrategy::RootRelative, "contents/ch2.md", "notes/x.md"),
            "/notes/x.md"
        );
    }

    // === files moved by other tools ===

    #[test]
    fn physically_moved_file_with_stale_metadata() {
        let fx = Fixture::sample();
        fx.file("settings/x.md", "Back to [world](world.md) and [hero](characters/hero.md).\n");
        fx.file("settings/world.md", "[x](./x.md)\n");
        fs::create_dir_all(fx.root().join("lore")).unwrap();
        fs::rename(fx.root().join("settings/x.md"), fx.root().join("lore/y.md")).unwrap();

        let result = rename(&fx, "settings/x.md", "lore/y.md");

        assert!(result.success, "{:?}", result);
        assert!(result.failed_files.is_empty());
        assert!(!fx.exists("settings/x.md"));
        assert_eq!(
            fx.read("lore/y.md"),
            "Back to [world](../settings/world.md) and [hero](../settings/characters/hero.md).\n"
        );
        assert_eq!(fx.read("settings/world.md"), "[x](../lore/y.md)\n");
        assert!(result.updated_files.contains(&"lore/y.md".to_string()));
        assert!(fx.read("contents/ch1.md").contains("[b](../lore/y.md)"));
    }

    // === write failures ===

    /// Make `path` read-only. Returns false where permissions are not enforced
    /// (running as root), in which case the caller skips.
    fn make_read_only(path: &std::path::Path) -> bool {
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(path, perms).unwrap();
        fs::OpenOptions::new().append(true).open(path).is_err()
    }

    #[test]
    fn unwritable_files_are_reported_while_others_are_rewritten() {
        let fx = Fixture::sample();
        let hero = fx.root().join("settings/characters/hero.md");
        let record = fx.root().join("contents/.quill-meta.yaml");
        if !make_read_only(&hero) || !make_read_only(&record) {
            eprintln!("permissions not enforced, skipping");
            return;
        }

        let result = rename(&fx, "settings/world.md", "settings/world-setting.md");

        assert!(!result.success);
        let failed: Vec<&str> = result.failed_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(failed, vec!["settings/characters/hero.md", "contents/.quill-meta.yaml"]);
        assert_eq!(result.updated_files, vec!["contents/ch1.md"]);
        assert!(fx.read("contents/ch1.md").contains("(../settings/world-setting.md \"World\")"));
        assert_eq!(fx.read("settings/characters/hero.md"), "> Back to [world](../world.md)\n");
        assert!(result.message.ends_with("2 failed"));
    }

    #[test]
    fn explicit_references_with_other_spellings_are_rewritten() {
        let fx = Fixture::sample();
        fx.meta(
            "contents",
            "files:\n  - name: ch1.md\n    type: content\n    references: [./settings/world.md, settings/x.md]\n    tags: [draft]\n  - name: ch2.md\n    type: content\n",
        );
        rename(&fx, "settings/world.md", "lore/world.md");
        let record = fx.tree().load_record("contents").unwrap().unwrap();
        let ch1 = record.entry("ch1.md").unwrap();
        assert_eq!(
            ch1.references.as_deref(),
            Some(&["lore/world.md".to_string(), "settings/x.md".to_string()][..])
        );
        assert!(ch1.extra.contains_key("tags"));
    }
}
