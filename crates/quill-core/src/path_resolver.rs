use crate::metadata::{FileKind, ProjectFile};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;

/// Target prefixes that never address a project file.
pub const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "file://", "mailto:"];

// ---------------------------------------------------------------------------
// Pure path helpers
// ---------------------------------------------------------------------------

/// True for URLs, mail links and pure in-page anchors.
pub fn is_external_target(target: &str) -> bool {
    let target = target.trim();
    if target.starts_with('#') {
        return true;
    }
    let lower = target.to_ascii_lowercase();
    EXTERNAL_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Directory part of a project-relative path ("" for files at the root).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of a project-relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// True when `path` is `dir` itself or lies underneath it.
pub fn is_within(path: &str, dir: &str) -> bool {
    dir.is_empty() || path == dir || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

/// Normalize a path against the project root.
///
/// Resolves `.` and `..`, collapses repeated separators, turns backslashes
/// into `/` and drops a leading `/`. Returns `None` when the path climbs
/// above the root or is empty after normalization.
pub fn normalize_path(path: &str) -> Option<String> {
    let path = path.trim().replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(part),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Resolve `target` relative to the directory containing `origin_file`.
///
/// Example: `resolve_relative("contents/ch1.md", "../settings/x.md")` → `"settings/x.md"`
///
/// A target starting with `/` is root-anchored and has no origin-relative reading.
pub fn resolve_relative(origin_file: &str, target: &str) -> Option<String> {
    if target.starts_with('/') {
        return None;
    }
    normalize_path(&join_path(parent_dir(origin_file), target))
}

/// Compute the link text that reaches `target` from a document at `source_file`.
///
/// - `("contents/ch1.md", "settings/world.md")` → `"../settings/world.md"`
/// - `("settings/world.md", "settings/characters/hero.md")` → `"characters/hero.md"`
/// - `("ch1.md", "ch2.md")` → `"ch2.md"`
pub fn relative_link(source_file: &str, target: &str) -> String {
    let source_segments: Vec<&str> = parent_dir(source_file)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let target_segments: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    // The file name itself never counts toward the shared prefix.
    let common_len = source_segments
        .iter()
        .zip(target_segments[..target_segments.len().saturating_sub(1)].iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; source_segments.len() - common_len];
    parts.extend_from_slice(&target_segments[common_len..]);
    parts.join("/")
}

/// Split a link target into its path and `#fragment` (fragment keeps the `#`).
pub fn split_fragment(target: &str) -> (&str, &str) {
    match target.find('#') {
        Some(idx) => target.split_at(idx),
        None => (target, ""),
    }
}

fn decode_target(path: &str) -> Cow<'_, str> {
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }
    match urlencoding::decode(path) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Borrowed(path),
    }
}

// ---------------------------------------------------------------------------
// Resolution strategies
// ---------------------------------------------------------------------------

/// One way of reading a link target. Strategies are tried in `STRATEGIES`
/// order and the first candidate naming a known file wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Relative to the directory of the file containing the link.
    OriginRelative,
    /// Relative to the project root.
    RootRelative,
}

pub const STRATEGIES: [ResolutionStrategy; 2] = [
    ResolutionStrategy::OriginRelative,
    ResolutionStrategy::RootRelative,
];

impl ResolutionStrategy {
    /// Candidate canonical path for `target_path` written in `origin_file`.
    pub fn candidate(self, target_path: &str, origin_file: &str) -> Option<String> {
        match self {
            ResolutionStrategy::OriginRelative => resolve_relative(origin_file, target_path),
            ResolutionStrategy::RootRelative => normalize_path(target_path),
        }
    }
}

/// A successfully resolved link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical project-relative path of the target.
    pub path: String,
    pub strategy: ResolutionStrategy,
}

/// A file that moved from `old` to `new` (both canonical).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathMove {
    pub old: String,
    pub new: String,
}

impl PathMove {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// PathResolver
// ---------------------------------------------------------------------------

/// Canonicalizes link targets against the set of files known to the project.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    known: HashSet<String>,
}

impl PathResolver {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Link targets are files; subdirectories are never addressable by a link.
    pub fn from_files(files: &[ProjectFile]) -> Self {
        Self::new(
            files
                .iter()
                .filter(|f| f.kind != FileKind::Subdirectory)
                .map(|f| f.path.clone()),
        )
    }

    pub fn contains(&self, path: &str) -> bool {
        self.known.contains(path)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// The view of the project before `moves` happened: each new path is
    /// replaced by its old path. Works whether or not the metadata already
    /// reflects the moves.
    pub fn before_moves(&self, moves: &[PathMove]) -> PathResolver {
        let mut known = self.known.clone();
        for mv in moves {
            known.remove(&mv.new);
        }
        for mv in moves {
            known.insert(mv.old.clone());
        }
        PathResolver { known }
    }

    /// The view of the project once `moves` have happened.
    pub fn after_moves(&self, moves: &[PathMove]) -> PathResolver {
        let mut known = self.known.clone();
        for mv in moves {
            known.remove(&mv.old);
        }
        for mv in moves {
            known.insert(mv.new.clone());
        }
        PathResolver { known }
    }

    /// Resolve `raw_target` written inside `origin_file`, reporting which
    /// strategy matched. External targets, anchors and empty targets never resolve.
    pub fn resolve(&self, raw_target: &str, origin_file: &str) -> Option<Resolution> {
        let raw_target = raw_target.trim();
        if raw_target.is_empty() || is_external_target(raw_target) {
            return None;
        }
        let (path_part, _fragment) = split_fragment(raw_target);
        if path_part.is_empty() {
            return None;
        }
        let decoded = decode_target(path_part);

        STRATEGIES.iter().find_map(|strategy| {
            strategy
                .candidate(&decoded, origin_file)
                .filter(|candidate| self.known.contains(candidate))
                .map(|path| Resolution {
                    path,
                    strategy: *strategy,
                })
        })
    }

    pub fn resolve_canonical(&self, raw_target: &str, origin_file: &str) -> Option<String> {
        self.resolve(raw_target, origin_file).map(|r| r.path)
    }

    pub fn is_project_file(&self, raw_target: &str, origin_file: &str) -> bool {
        self.resolve(raw_target, origin_file).is_some()
    }
}
