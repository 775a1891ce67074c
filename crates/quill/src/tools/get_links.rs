use super::{push_list, to_json};
use quill_core::path_resolver::normalize_path;
use quill_core::Project;

/// Execute `links`: explicit references, hyperlinks and reverse references of one file.
pub fn execute(project: &Project, file_path: &str, json: bool) -> Result<String, String> {
    let path = normalize_path(file_path).ok_or_else(|| format!("Invalid path: {}", file_path))?;
    if !project.index().resolver().contains(&path) {
        return Err(format!("Error: Document not found: {}", file_path));
    }

    let refs = project.references(&path);
    if json {
        return to_json(&refs);
    }

    let mut output = String::new();
    push_list(&mut output, "References (from metadata):", &refs.references);
    output.push('\n');
    push_list(&mut output, "Hyperlinks (documents this links to):", &refs.hyperlinks);
    output.push('\n');
    push_list(
        &mut output,
        "Referenced by:",
        refs.referenced_by.iter().map(|entry| {
            let source = match entry.source {
                quill_core::ReferenceSource::Manual => "manual",
                quill_core::ReferenceSource::Hyperlink => "hyperlink",
            };
            format!("{} ({})", entry.path, source)
        }),
    );

    let broken = project.index().unresolved_links(&path);
    if !broken.is_empty() {
        output.push('\n');
        push_list(&mut output, "Broken links:", broken);
    }
    Ok(output)
}
