use crate::config::ProjectConfig;
use crate::error::{ProjectError, Result};
use crate::event_bus::{ChangeEvent, ChangeKind, EventBus};
use crate::link_updater::{LinkUpdateResult, LinkUpdater};
use crate::metadata::{FileKind, MetaEntry, MetaRecord, MetadataTree};
use crate::path_resolver::{file_name, is_within, join_path, normalize_path, parent_dir};
use crate::reference_index::{FileReferences, ReferenceIndex};
use std::fs;
use std::io;
use std::path::Path;

fn canonical(path: &str) -> Result<String> {
    normalize_path(path).ok_or_else(|| ProjectError::InvalidPath(path.to_string()))
}

/// Directory paths may be empty (the project root).
fn canonical_dir(dir: &str) -> Result<String> {
    let trimmed = dir.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return Ok(String::new());
    }
    canonical(dir)
}

fn split(path: &str) -> (String, String) {
    (parent_dir(path).to_string(), file_name(path).to_string())
}

/// An open writing project: configuration, metadata tree, reference index and
/// change notifications.
///
/// Every structural operation validates first, touches the disk, rewrites
/// links where paths changed, reinitializes the index and then publishes
/// events. Validation or physical failures return `Err` before any link is
/// rewritten.
#[derive(Debug)]
pub struct Project {
    config: ProjectConfig,
    tree: MetadataTree,
    index: ReferenceIndex,
    events: EventBus,
}

impl Project {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config = ProjectConfig::load(root)?;
        let tree = MetadataTree::new(root, config.metadata_file.clone());
        let index = ReferenceIndex::build(&tree)?;
        tracing::info!("Opened project at {:?}", root);
        Ok(Self {
            config,
            tree,
            index,
            events: EventBus::new(),
        })
    }

    pub fn root(&self) -> &Path {
        self.tree.root()
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn tree(&self) -> &MetadataTree {
        &self.tree
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn reinitialize(&mut self) -> Result<()> {
        self.index.initialize(&self.tree)
    }

    pub fn references(&self, path: &str) -> FileReferences {
        self.index.get_references(path)
    }

    pub fn all_reference_paths(&self, path: &str) -> Vec<String> {
        self.index.get_all_reference_paths(path)
    }

    /// Re-read one document after its text was edited outside the project.
    pub fn refresh_hyperlinks(&mut self, path: &str) -> usize {
        self.index.update_file_hyperlink_references(path)
    }

    fn updater(&self) -> LinkUpdater<'_> {
        LinkUpdater::new(&self.tree).rewrite_outgoing(self.config.links.rewrite_outgoing)
    }

    /// Rewrite links for a move that already happened on disk (or is about
    /// to). Only links and references change; files and entries stay put.
    pub fn update_links(&mut self, old_path: &str, new_path: &str) -> Result<LinkUpdateResult> {
        let result = self.updater().update_links_after_file_operation(old_path, new_path);
        self.reinitialize()?;
        self.publish_link_updates(&result);
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Structural operations
    // -----------------------------------------------------------------------

    /// Create a document (or an empty tracked subdirectory) and register it
    /// at the end of `dir`'s record. Returns the new canonical path.
    pub fn create_file(&mut self, dir: &str, name: &str, kind: FileKind, contents: &str) -> Result<String> {
        let dir = canonical_dir(dir)?;
        self.check_entry_name(name)?;
        let path = join_path(&dir, name);

        let mut record = self.load_dir_record(&dir)?;
        let full_path = self.tree.absolute(&path);
        if record.entry(name).is_some() || full_path.exists() {
            return Err(ProjectError::AlreadyExists(path));
        }

        match kind {
            FileKind::Subdirectory => {
                fs::create_dir(&full_path).map_err(|e| ProjectError::io(&full_path, e))?;
                self.tree.save_record(&path, &MetaRecord::default())?;
            }
            FileKind::Content | FileKind::Setting => {
                fs::write(&full_path, contents).map_err(|e| ProjectError::io(&full_path, e))?;
            }
        }
        record.files.push(MetaEntry::new(name, kind));
        self.tree.save_record(&dir, &record)?;
        self.reinitialize()?;

        tracing::info!("Created {}", path);
        self.events.publish(&ChangeEvent::new(ChangeKind::FileCreated, &path));
        self.events
            .publish(&ChangeEvent::new(ChangeKind::MetadataUpdated, self.tree.record_path(&dir)));
        Ok(path)
    }

    /// Rename or move a file, carrying its metadata entry along and rewriting
    /// every link to it. A tracked subdirectory is handed to `move_directory`.
    pub fn move_file(&mut self, old_path: &str, new_path: &str) -> Result<LinkUpdateResult> {
        let old = canonical(old_path)?;
        let new = canonical(new_path)?;
        if old == new {
            return Ok(self.updater().update_links_after_file_operation(&old, &new));
        }
        let (old_dir, old_name) = split(&old);
        let record = self.load_dir_record(&old_dir)?;
        match record.entry(&old_name) {
            Some(entry) if entry.kind == FileKind::Subdirectory => return self.move_directory(&old, &new),
            Some(_) => {}
            None => return Err(ProjectError::NotFound(old)),
        }

        let touched = self.relocate(&old, &new)?;
        let result = self.updater().update_links_after_file_operation(&old, &new);
        self.reinitialize()?;

        tracing::info!("Moved {} -> {}: {}", old, new, result.message);
        self.events.publish(&ChangeEvent::moved(&old, &new));
        for record_path in touched {
            self.events
                .publish(&ChangeEvent::new(ChangeKind::MetadataUpdated, record_path));
        }
        self.publish_link_updates(&result);
        Ok(result)
    }

    /// Move a tracked subdirectory with everything in it.
    pub fn move_directory(&mut self, old_dir: &str, new_dir: &str) -> Result<LinkUpdateResult> {
        let old = canonical(old_dir)?;
        let new = canonical(new_dir)?;
        if old == new {
            return Ok(self.updater().update_links_after_directory_move(&old, &new));
        }
        if is_within(&new, &old) {
            return Err(ProjectError::InvalidPath(format!("cannot move {} into itself", old)));
        }
        let (parent, name) = split(&old);
        let record = self.load_dir_record(&parent)?;
        match record.entry(&name) {
            Some(entry) if entry.kind == FileKind::Subdirectory => {}
            Some(_) => return Err(ProjectError::InvalidPath(format!("{} is not a directory", old))),
            None => return Err(ProjectError::NotFound(old)),
        }

        let touched = self.relocate(&old, &new)?;
        let result = self.updater().update_links_after_directory_move(&old, &new);
        self.reinitialize()?;

        tracing::info!("Moved directory {} -> {}: {}", old, new, result.message);
        self.events.publish(&ChangeEvent::moved(&old, &new));
        for record_path in touched {
            self.events
                .publish(&ChangeEvent::new(ChangeKind::MetadataUpdated, record_path));
        }
        self.publish_link_updates(&result);
        Ok(result)
    }

    /// Delete a document and its metadata entry. Links to it become broken
    /// links; they are not rewritten.
    pub fn delete_file(&mut self, path: &str) -> Result<()> {
        let path = canonical(path)?;
        let (dir, name) = split(&path);
        let mut record = self.load_dir_record(&dir)?;
        match record.entry(&name) {
            Some(entry) if entry.kind == FileKind::Subdirectory => {
                return Err(ProjectError::InvalidPath(format!("{} is a directory", path)));
            }
            Some(_) => {}
            None => return Err(ProjectError::NotFound(path)),
        }

        let full_path = self.tree.absolute(&path);
        match fs::remove_file(&full_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("{} was already gone from disk, removing its entry", path);
            }
            Err(e) => return Err(ProjectError::io(full_path, e)),
        }
        record.remove_entry(&name);
        self.tree.save_record(&dir, &record)?;
        self.reinitialize()?;

        tracing::info!("Deleted {}", path);
        self.events.publish(&ChangeEvent::new(ChangeKind::FileDeleted, &path));
        self.events
            .publish(&ChangeEvent::new(ChangeKind::MetadataUpdated, self.tree.record_path(&dir)));
        Ok(())
    }

    /// Move the entry at position `from` of `dir`'s record to position `to`.
    pub fn reorder_file(&mut self, dir: &str, from: usize, to: usize) -> Result<()> {
        let dir = canonical_dir(dir)?;
        let mut record = self.load_dir_record(&dir)?;
        let len = record.files.len();
        if from >= len || to >= len {
            return Err(ProjectError::InvalidPath(format!(
                "position out of range in {} ({} entries)",
                self.tree.record_path(&dir),
                len
            )));
        }
        if from == to {
            return Ok(());
        }
        let entry = record.files.remove(from);
        let path = join_path(&dir, &entry.name);
        record.files.insert(to, entry);
        self.tree.save_record(&dir, &record)?;

        tracing::debug!("Reordered {} from {} to {}", path, from, to);
        self.events.publish(
            &ChangeEvent::new(ChangeKind::FileReordered, path)
                .with_metadata("from", from)
                .with_metadata("to", to),
        );
        Ok(())
    }

    /// Add an explicit reference from `path` to `target`. Returns false if it
    /// was already listed (in any spelling).
    pub fn add_reference(&mut self, path: &str, target: &str) -> Result<bool> {
        let target = canonical(target)?;
        self.edit_references(path, "added", &target, |references| {
            if references.iter().any(|r| normalize_path(r).as_deref() == Some(target.as_str())) {
                return false;
            }
            references.push(target.clone());
            true
        })
    }

    /// Remove every spelling of `target` from `path`'s explicit references.
    pub fn remove_reference(&mut self, path: &str, target: &str) -> Result<bool> {
        let target = canonical(target)?;
        self.edit_references(path, "removed", &target, |references| {
            let before = references.len();
            references.retain(|r| normalize_path(r).as_deref() != Some(target.as_str()));
            before != references.len()
        })
    }

    fn edit_references<F>(&mut self, path: &str, action: &str, target: &str, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut Vec<String>) -> bool,
    {
        let path = canonical(path)?;
        let (dir, name) = split(&path);
        let mut record = self.load_dir_record(&dir)?;
        let entry = record
            .entry_mut(&name)
            .ok_or_else(|| ProjectError::NotFound(path.clone()))?;

        let mut references = entry.references.take().unwrap_or_default();
        let changed = edit(&mut references);
        let current = references.clone();
        entry.references = (!references.is_empty()).then_some(references);
        if !changed {
            return Ok(false);
        }

        self.tree.save_record(&dir, &record)?;
        self.index.replace_explicit_references(&path, &current);

        tracing::debug!("Reference {} {} {}", target, action, path);
        self.events.publish(
            &ChangeEvent::new(ChangeKind::ReferenceUpdated, &path).with_metadata(action, target),
        );
        self.events
            .publish(&ChangeEvent::new(ChangeKind::MetadataUpdated, self.tree.record_path(&dir)));
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn load_dir_record(&self, dir: &str) -> Result<MetaRecord> {
        self.tree.load_record(dir)?.ok_or_else(|| {
            ProjectError::NotFound(format!("metadata record {}", self.tree.record_path(dir)))
        })
    }

    fn check_entry_name(&self, name: &str) -> Result<()> {
        let invalid = name.trim().is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
            || name == self.tree.metadata_file();
        if invalid {
            return Err(ProjectError::InvalidPath(name.to_string()));
        }
        Ok(())
    }

    /// Physically move `old` to `new` and carry its metadata entry along.
    /// Returns the record paths that were rewritten.
    fn relocate(&self, old: &str, new: &str) -> Result<Vec<String>> {
        let (old_dir, old_name) = split(old);
        let (new_dir, new_name) = split(new);
        self.check_entry_name(&new_name)?;

        let mut old_record = self.load_dir_record(&old_dir)?;
        let mut new_record = if new_dir == old_dir {
            None
        } else {
            Some(self.load_dir_record(&new_dir)?)
        };
        let target_record = new_record.as_ref().unwrap_or(&old_record);
        let new_full = self.tree.absolute(new);
        if target_record.entry(&new_name).is_some() || new_full.exists() {
            return Err(ProjectError::AlreadyExists(new.to_string()));
        }

        let old_full = self.tree.absolute(old);
        fs::rename(&old_full, &new_full).map_err(|e| ProjectError::io(&old_full, e))?;

        let mut touched = vec![self.tree.record_path(&old_dir)];
        match new_record.as_mut() {
            None => {
                if let Some(entry) = old_record.entry_mut(&old_name) {
                    entry.name = new_name;
                }
                self.tree.save_record(&old_dir, &old_record)?;
            }
            Some(new_record) => {
                let mut entry = old_record
                    .remove_entry(&old_name)
                    .ok_or_else(|| ProjectError::NotFound(old.to_string()))?;
                entry.name = new_name;
                new_record.files.push(entry);
                self.tree.save_record(&old_dir, &old_record)?;
                self.tree.save_record(&new_dir, new_record)?;
                touched.push(self.tree.record_path(&new_dir));
            }
        }
        Ok(touched)
    }

    fn publish_link_updates(&self, result: &LinkUpdateResult) {
        for path in &result.updated_files {
            let kind = if file_name(path) == self.tree.metadata_file() {
                ChangeKind::MetadataUpdated
            } else {
                ChangeKind::ReferenceUpdated
            };
            self.events.publish(&ChangeEvent::new(kind, path));
        }
    }
}
