use super::to_json;
use quill_core::Project;

/// Execute `reindex`: rebuild the reference index and print its statistics.
pub fn execute(project: &mut Project, json: bool) -> Result<String, String> {
    project
        .reinitialize()
        .map_err(|e| format!("Error: {}", e))?;
    let stats = project.index().stats();
    if json {
        return to_json(&stats);
    }
    Ok(format!(
        "Indexed {} files: {} explicit references, {} hyperlinks, {} broken links\n",
        stats.files, stats.explicit_edges, stats.hyperlink_edges, stats.unresolved_links
    ))
}
