use crate::error::{ProjectError, Result};
use crate::path_resolver::join_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Kind tag of a metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Content,
    Setting,
    Subdirectory,
}

impl FileKind {
    /// Content and setting files carry document text; subdirectories don't.
    pub fn is_document(self) -> bool {
        !matches!(self, FileKind::Subdirectory)
    }
}

/// One entry of a directory's metadata record.
///
/// Only `name`, `type` and `references` matter to the reference graph. Every
/// other field (tags, character info, foreshadowing points, ...) is carried in
/// `extra` so rewriting a record never drops authored data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl MetaEntry {
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
            references: None,
            extra: BTreeMap::new(),
        }
    }
}

/// A per-directory metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(default)]
    pub files: Vec<MetaEntry>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl MetaRecord {
    pub fn entry(&self, name: &str) -> Option<&MetaEntry> {
        self.files.iter().find(|e| e.name == name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut MetaEntry> {
        self.files.iter_mut().find(|e| e.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|e| e.name == name)
    }

    pub fn remove_entry(&mut self, name: &str) -> Option<MetaEntry> {
        let idx = self.position(name)?;
        Some(self.files.remove(idx))
    }
}

/// A tracked file or subdirectory, flattened out of the metadata tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFile {
    /// Canonical project-relative path, e.g. "settings/world.md".
    pub path: String,
    pub name: String,
    pub kind: FileKind,
    /// Explicit references exactly as authored in the record.
    pub references: Vec<String>,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, kind: FileKind) -> Self {
        let path = path.into();
        let name = crate::path_resolver::file_name(&path).to_string();
        Self {
            path,
            name,
            kind,
            references: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// MetadataTree
// ---------------------------------------------------------------------------

/// Reads and writes the per-directory metadata records under a project root.
///
/// Directories are addressed by project-relative path, `""` being the root.
#[derive(Debug, Clone)]
pub struct MetadataTree {
    root: PathBuf,
    metadata_file: String,
}

impl MetadataTree {
    pub fn new(root: impl Into<PathBuf>, metadata_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            metadata_file: metadata_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_file(&self) -> &str {
        &self.metadata_file
    }

    /// Absolute path of a project-relative path.
    pub fn absolute(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    /// Project-relative path of a directory's metadata record.
    pub fn record_path(&self, dir: &str) -> String {
        join_path(dir, &self.metadata_file)
    }

    /// Load the record of `dir`. A missing record is `Ok(None)`.
    pub fn load_record(&self, dir: &str) -> Result<Option<MetaRecord>> {
        let path = self.absolute(&self.record_path(dir));
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProjectError::io(path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Some(MetaRecord::default()));
        }
        serde_yaml::from_str(&content)
            .map(Some)
            .map_err(|source| ProjectError::Metadata { path, source })
    }

    pub fn save_record(&self, dir: &str, record: &MetaRecord) -> Result<()> {
        let path = self.absolute(&self.record_path(dir));
        let yaml = serde_yaml::to_string(record)
            .map_err(|source| ProjectError::Metadata { path: path.clone(), source })?;
        fs::write(&path, yaml).map_err(|e| ProjectError::io(path, e))
    }

    /// Enumerate every tracked file and subdirectory, depth first in record order.
    ///
    /// The root record must exist: an inaccessible project is an error, never
    /// an empty project. Subdirectories without a record are treated as empty.
    pub fn enumerate(&self) -> Result<Vec<ProjectFile>> {
        if !self.root.is_dir() {
            return Err(ProjectError::io(
                &self.root,
                io::Error::new(io::ErrorKind::NotFound, "project root is not a directory"),
            ));
        }
        let root_record = self.load_record("")?.ok_or_else(|| {
            ProjectError::NotFound(format!(
                "metadata record {}",
                self.absolute(&self.record_path("")).display()
            ))
        })?;

        let mut files = Vec::new();
        self.collect(&root_record, "", &mut files)?;
        tracing::debug!("Enumerated {} project entries under {:?}", files.len(), self.root);
        Ok(files)
    }

    fn collect(&self, record: &MetaRecord, dir: &str, out: &mut Vec<ProjectFile>) -> Result<()> {
        for entry in &record.files {
            let path = join_path(dir, &entry.name);
            out.push(ProjectFile {
                path: path.clone(),
                name: entry.name.clone(),
                kind: entry.kind,
                references: entry.references.clone().unwrap_or_default(),
            });
            if entry.kind == FileKind::Subdirectory {
                match self.load_record(&path)? {
                    Some(child) => self.collect(&child, &path, out)?,
                    None => tracing::debug!("No metadata record in {}, treating as empty", path),
                }
            }
        }
        Ok(())
    }

    /// Every tracked directory that has a record, root first.
    pub fn directories(files: &[ProjectFile]) -> Vec<String> {
        std::iter::once(String::new())
            .chain(
                files
                    .iter()
                    .filter(|f| f.kind == FileKind::Subdirectory)
                    .map(|f| f.path.clone()),
            )
            .collect()
    }
}
