use crate::error::Result;
use crate::link_parser::read_and_resolve;
use crate::metadata::MetadataTree;
use crate::path_resolver::{normalize_path, PathResolver};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Where an edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Listed in the source file's metadata `references`.
    Explicit,
    /// Parsed out of the source file's text.
    Hyperlink,
}

/// Provenance tag as shown on reverse edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSource {
    Manual,
    Hyperlink,
}

impl From<Provenance> for ReferenceSource {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Explicit => ReferenceSource::Manual,
            Provenance::Hyperlink => ReferenceSource::Hyperlink,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReferenceEdge {
    pub source: String,
    pub target: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub path: String,
    pub source: ReferenceSource,
}

/// Everything the index knows about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReferences {
    /// Explicit references from metadata, canonicalized, authored order.
    pub references: Vec<String>,
    /// Hyperlink-derived references, first occurrence order.
    pub hyperlinks: Vec<String>,
    /// Who references this file, one entry per (path, source).
    pub referenced_by: Vec<ReferenceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub files: usize,
    pub explicit_edges: usize,
    pub hyperlink_edges: usize,
    pub unresolved_links: usize,
}

/// A `ReferenceIndex` shared across threads: one writer at a time around
/// rebuilds and refreshes, readers share the last completed state.
pub type SharedReferenceIndex = Arc<RwLock<ReferenceIndex>>;

// ---------------------------------------------------------------------------
// ReferenceIndex
// ---------------------------------------------------------------------------

/// Forward and reverse reference edges for every file of a project.
///
/// Every edge lives in both `outgoing[source]` and `incoming[target]`; all
/// mutation goes through `add_edge` / `remove_edges_from`, which touch both
/// sides in the same call.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    root: PathBuf,
    resolver: PathResolver,
    outgoing: HashMap<String, Vec<ReferenceEdge>>,
    incoming: HashMap<String, Vec<ReferenceEdge>>,
    unresolved: HashMap<String, Vec<String>>,
    initialized: bool,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a full scan of `tree`.
    pub fn build(tree: &MetadataTree) -> Result<Self> {
        let mut index = Self::new();
        index.initialize(tree)?;
        Ok(index)
    }

    /// Full rebuild. On error the previous state is kept untouched.
    pub fn initialize(&mut self, tree: &MetadataTree) -> Result<()> {
        let started = Instant::now();
        let files = tree.enumerate()?;

        let mut next = ReferenceIndex {
            root: tree.root().to_path_buf(),
            resolver: PathResolver::from_files(&files),
            ..Default::default()
        };

        let mut documents = 0usize;
        for file in &files {
            for reference in &file.references {
                match normalize_path(reference) {
                    Some(target) => {
                        next.add_edge(&file.path, &target, Provenance::Explicit);
                    }
                    None => tracing::warn!(
                        "Ignoring invalid explicit reference {:?} in {}",
                        reference,
                        file.path
                    ),
                }
            }

            if !file.kind.is_document() {
                continue;
            }
            documents += 1;
            // Unreadable documents contribute no hyperlinks.
            match read_and_resolve(&next.resolver, &next.root, &file.path) {
                Ok(links) => {
                    for target in &links.targets {
                        next.add_edge(&file.path, target, Provenance::Hyperlink);
                    }
                    if !links.unresolved.is_empty() {
                        next.unresolved.insert(file.path.clone(), links.unresolved);
                    }
                }
                Err(e) => tracing::warn!("Skipping hyperlinks of {}: {}", file.path, e),
            }
        }
        next.initialized = true;

        let stats = next.stats();
        tracing::info!(
            "Reference index built: {} files, {} documents, {} explicit + {} hyperlink edges, {} unresolved links in {:?}",
            stats.files,
            documents,
            stats.explicit_edges,
            stats.hyperlink_edges,
            stats.unresolved_links,
            started.elapsed()
        );
        *self = next;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn into_shared(self) -> SharedReferenceIndex {
        Arc::new(RwLock::new(self))
    }

    // -----------------------------------------------------------------------
    // Edge maintenance
    // -----------------------------------------------------------------------

    /// Insert an edge on both sides. Returns false if it was already present.
    fn add_edge(&mut self, source: &str, target: &str, provenance: Provenance) -> bool {
        let edge = ReferenceEdge {
            source: source.to_string(),
            target: target.to_string(),
            provenance,
        };
        let outgoing = self.outgoing.entry(source.to_string()).or_default();
        if outgoing.contains(&edge) {
            return false;
        }
        outgoing.push(edge.clone());
        self.incoming.entry(target.to_string()).or_default().push(edge);
        true
    }

    /// Remove every edge of `provenance` leaving `source`, on both sides.
    /// Returns the number of edges removed.
    fn remove_edges_from(&mut self, source: &str, provenance: Provenance) -> usize {
        let Some(edges) = self.outgoing.get_mut(source) else {
            return 0;
        };
        let (removed, kept): (Vec<ReferenceEdge>, Vec<ReferenceEdge>) =
            edges.drain(..).partition(|e| e.provenance == provenance);
        *edges = kept;
        if edges.is_empty() {
            self.outgoing.remove(source);
        }

        for edge in &removed {
            if let Some(incoming) = self.incoming.get_mut(&edge.target) {
                incoming.retain(|e| e != edge);
                if incoming.is_empty() {
                    self.incoming.remove(&edge.target);
                }
            }
        }
        removed.len()
    }

    /// Recompute the hyperlink edges of one file from its current text.
    ///
    /// Explicit edges are left alone. Reverse edges of both the old and the new
    /// targets are updated in the same call. A file the index does not know
    /// (or cannot read) ends up with no hyperlink edges. Returns the new number
    /// of hyperlink targets.
    pub fn update_file_hyperlink_references(&mut self, path: &str) -> usize {
        if !self.initialized {
            tracing::warn!("Hyperlink refresh of {} before initialize, ignoring", path);
            return 0;
        }
        let Some(path) = normalize_path(path) else {
            return 0;
        };

        let removed = self.remove_edges_from(&path, Provenance::Hyperlink);
        self.unresolved.remove(&path);

        if !self.resolver.contains(&path) {
            tracing::debug!("{} is not a known document, dropped {} hyperlink edges", path, removed);
            return 0;
        }

        let links = match read_and_resolve(&self.resolver, &self.root, &path) {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Cannot refresh hyperlinks of {}: {}", path, e);
                return 0;
            }
        };
        for target in &links.targets {
            self.add_edge(&path, target, Provenance::Hyperlink);
        }
        if !links.unresolved.is_empty() {
            self.unresolved.insert(path.clone(), links.unresolved);
        }
        tracing::debug!(
            "Refreshed hyperlinks of {}: {} removed, {} current",
            path,
            removed,
            links.targets.len()
        );
        links.targets.len()
    }

    /// Replace the explicit edges of one file, e.g. after its metadata
    /// `references` list was edited. Hyperlink edges are left alone.
    pub fn replace_explicit_references(&mut self, path: &str, references: &[String]) {
        let Some(path) = normalize_path(path) else {
            return;
        };
        self.remove_edges_from(&path, Provenance::Explicit);
        for reference in references {
            if let Some(target) = normalize_path(reference) {
                self.add_edge(&path, &target, Provenance::Explicit);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Forward edges of `path` in insertion order.
    pub fn outgoing(&self, path: &str) -> &[ReferenceEdge] {
        normalize_path(path)
            .and_then(|p| self.outgoing.get(&p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reverse edges of `path` in insertion order.
    pub fn incoming(&self, path: &str) -> &[ReferenceEdge] {
        normalize_path(path)
            .and_then(|p| self.incoming.get(&p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn targets_of(&self, path: &str, provenance: Provenance) -> Vec<String> {
        self.outgoing(path)
            .iter()
            .filter(|e| e.provenance == provenance)
            .map(|e| e.target.clone())
            .collect()
    }

    /// References of `path` (explicit and hyperlink) and who references it.
    /// Unknown paths yield empty lists.
    pub fn get_references(&self, path: &str) -> FileReferences {
        let mut referenced_by: Vec<ReferenceEntry> = Vec::new();
        for edge in self.incoming(path) {
            let entry = ReferenceEntry {
                path: edge.source.clone(),
                source: edge.provenance.into(),
            };
            if !referenced_by.contains(&entry) {
                referenced_by.push(entry);
            }
        }
        FileReferences {
            references: self.targets_of(path, Provenance::Explicit),
            hyperlinks: self.targets_of(path, Provenance::Hyperlink),
            referenced_by,
        }
    }

    /// Explicit references followed by hyperlink targets, deduplicated by path.
    pub fn get_all_reference_paths(&self, path: &str) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        let explicit = self.targets_of(path, Provenance::Explicit);
        let hyperlinks = self.targets_of(path, Provenance::Hyperlink);
        for target in explicit.into_iter().chain(hyperlinks) {
            if !paths.contains(&target) {
                paths.push(target);
            }
        }
        paths
    }

    /// Link targets in `path` that did not resolve during the last scan.
    pub fn unresolved_links(&self, path: &str) -> &[String] {
        normalize_path(path)
            .and_then(|p| self.unresolved.get(&p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All broken links, sorted by source path.
    pub fn all_unresolved_links(&self) -> Vec<(String, Vec<String>)> {
        let mut all: Vec<(String, Vec<String>)> = self
            .unresolved
            .iter()
            .map(|(path, targets)| (path.clone(), targets.clone()))
            .collect();
        all.sort();
        all
    }

    /// Edges visible from only one side. Empty for a consistent graph.
    pub fn check_symmetry(&self) -> Vec<ReferenceEdge> {
        let mut broken = Vec::new();
        for edges in self.outgoing.values() {
            for edge in edges {
                let mirrored = self
                    .incoming
                    .get(&edge.target)
                    .is_some_and(|incoming| incoming.contains(edge));
                if !mirrored {
                    broken.push(edge.clone());
                }
            }
        }
        for edges in self.incoming.values() {
            for edge in edges {
                let mirrored = self
                    .outgoing
                    .get(&edge.source)
                    .is_some_and(|outgoing| outgoing.contains(edge));
                if !mirrored {
                    broken.push(edge.clone());
                }
            }
        }
        broken
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            files: self.resolver.len(),
            unresolved_links: self.unresolved.values().map(Vec::len).sum(),
            ..Default::default()
        };
        for edge in self.outgoing.values().flatten() {
            match edge.provenance {
                Provenance::Explicit => stats.explicit_edges += 1,
                Provenance::Hyperlink => stats.hyperlink_edges += 1,
            }
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
