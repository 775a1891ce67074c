//! Command implementations. Each `execute` returns the text to print on
//! success, or an error message for stderr (non-zero exit).

pub mod check;
pub mod get_links;
pub mod move_file;
pub mod reindex;
pub mod rewrite_links;

use quill_core::LinkUpdateResult;
use serde::Serialize;

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(|e| format!("Failed to serialize output: {}", e))
}

/// Section header followed by `- item` lines, or `- (none)`.
pub(crate) fn push_list<I, S>(output: &mut String, header: &str, items: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    output.push_str(header);
    output.push('\n');
    let mut empty = true;
    for item in items {
        empty = false;
        output.push_str(&format!("- {}\n", item.as_ref()));
    }
    if empty {
        output.push_str("- (none)\n");
    }
}

pub(crate) fn format_update(headline: &str, result: &LinkUpdateResult) -> String {
    let mut output = format!("{}\n{}\n", headline, result.message);
    if !result.updated_files.is_empty() {
        output.push('\n');
        push_list(&mut output, "Updated files:", &result.updated_files);
    }
    if !result.failed_files.is_empty() {
        output.push('\n');
        push_list(
            &mut output,
            "Failed files:",
            result
                .failed_files
                .iter()
                .map(|f| format!("{}: {}", f.path, f.error)),
        );
    }
    output
}
