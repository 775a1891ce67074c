
use crate::path_resolver::{is_external_target, split_fragment, PathResolver};
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

// Compile regex once, reuse across calls
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]*)\]\(([^\s)]*)(?:\s+"([^"]*)")?\)"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// May address a project file (whether it resolves is a separate question).
    Internal,
    /// URL, mail link or in-page anchor.
    External,
}

/// One hyperlink occurrence in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Display text between the brackets, possibly empty.
    pub text: String,
    /// Target exactly as written, possibly empty.
    pub target: String,
    pub title: Option<String>,
    /// Byte span of the whole `[text](target "title")` occurrence.
    pub span: Range<usize>,
    /// Byte span of `target` inside the source text.
    pub target_span: Range<usize>,
}

impl LinkRecord {
    pub fn kind(&self) -> LinkKind {
        if is_external_target(&self.target) {
            LinkKind::External
        } else {
            LinkKind::Internal
        }
    }

    /// Target without its `#fragment`.
    pub fn path(&self) -> &str {
        split_fragment(&self.target).0
    }
}

/// Parse every `[text](target)` / `[text](target "title")` occurrence.
///
/// Works on raw characters: surrounding Markdown (emphasis, code spans,
/// quotes, list markers) is not interpreted.
pub fn parse_links(markdown: &str) -> Vec<LinkRecord> {
    LINK_RE
        .captures_iter(markdown)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let target = cap.get(2)?;
            Some(LinkRecord {
                text: cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                target: target.as_str().to_string(),
                title: cap.get(3).map(|m| m.as_str().to_string()),
                span: whole.range(),
                target_span: target.range(),
            })
        })
        .collect()
}

/// Internal links of one document after canonicalization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedLinks {
    /// Canonical targets, deduplicated, first occurrence order.
    pub targets: Vec<String>,
    /// Internal-looking targets that named no known file, deduplicated.
    pub unresolved: Vec<String>,
}

/// Canonicalize the internal links of `markdown`, written in `origin_file`.
pub fn resolve_links(resolver: &PathResolver, markdown: &str, origin_file: &str) -> ResolvedLinks {
    let mut resolved = ResolvedLinks::default();
    for link in parse_links(markdown) {
        if link.kind() == LinkKind::External || link.target.trim().is_empty() {
            continue;
        }
        match resolver.resolve_canonical(&link.target, origin_file) {
            Some(path) => {
                if !resolved.targets.contains(&path) {
                    resolved.targets.push(path);
                }
            }
            None => {
                if !resolved.unresolved.contains(&link.target) {
                    resolved.unresolved.push(link.target);
                }
            }
        }
    }
    resolved
}

/// Read `file` (project-relative) and return its canonical internal link targets.
/// An unreadable file has no links.
pub fn extract_internal_links(resolver: &PathResolver, root: &Path, file: &str) -> Vec<String> {
    read_and_resolve(resolver, root, file)
        .map(|r| r.targets)
        .unwrap_or_default()
}

pub(crate) fn read_and_resolve(
    resolver: &PathResolver,
    root: &Path,
    file: &str,
) -> std::io::Result<ResolvedLinks> {
    let markdown = std::fs::read_to_string(root.join(file)).map_err(|e| {
        tracing::debug!("Cannot read {} for link extraction: {}", file, e);
        e
    })?;
    Ok(resolve_links(resolver, &markdown, file))
}

/// A text edit: replace `remove_len` bytes at `offset` with `insert_text`.
#[derive(Debug, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte offset in source
    pub offset: usize,
    /// Number of bytes to remove
    pub remove_len: usize,
    /// Replacement text
    pub insert_text: String,
}

/// Compute edits that replace the path portion of selected link targets.
///
/// `new_path_for` sees every parsed link and returns the replacement path
/// (without fragment) or `None` to leave the link alone. Display text, title
/// and `#fragment` are never touched. Returns edits in reverse offset order
/// for safe sequential application.
pub fn compute_link_rewrite_edits<F>(markdown: &str, mut new_path_for: F) -> Vec<TextEdit>
where
    F: FnMut(&LinkRecord) -> Option<String>,
{
    let mut edits: Vec<TextEdit> = parse_links(markdown)
        .iter()
        .filter_map(|link| {
            let new_path = new_path_for(link)?;
            let old_path = link.path();
            if new_path == old_path {
                return None;
            }
            Some(TextEdit {
                offset: link.target_span.start,
                remove_len: old_path.len(),
                insert_text: new_path,
            })
        })
        .collect();

    edits.sort_by(|a, b| b.offset.cmp(&a.offset));
    edits
}

/// Apply edits produced by `compute_link_rewrite_edits` (reverse offset order).
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut out = text.to_string();
    for edit in edits {
        out.replace_range(edit.offset..edit.offset + edit.remove_len, &edit.insert_text);
    }
    out
}
