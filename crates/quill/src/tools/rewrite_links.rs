use super::{format_update, to_json};
use quill_core::Project;

/// Execute `rewrite-links`: rewrite links from `old_path` to `new_path`
/// without moving anything. For files moved by other tools.
pub fn execute(project: &mut Project, old_path: &str, new_path: &str, json: bool) -> Result<String, String> {
    let result = project
        .update_links(old_path, new_path)
        .map_err(|e| format!("Error: {}", e))?;
    if json {
        return to_json(&result);
    }
    Ok(format_update(
        &format!("Rewrote links {} -> {}", old_path, new_path),
        &result,
    ))
}
