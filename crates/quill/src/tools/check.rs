use super::{push_list, to_json};
use quill_core::Project;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    ok: bool,
    files: usize,
    broken_links: BTreeMap<String, Vec<String>>,
    asymmetric_edges: Vec<String>,
}

/// Execute `check`: report broken links and any reference edge missing its
/// reverse side. Problems come back as `Err` so the process exits non-zero.
pub fn execute(project: &Project, json: bool) -> Result<String, String> {
    let index = project.index();
    let broken_links: BTreeMap<String, Vec<String>> = index.all_unresolved_links().into_iter().collect();
    let asymmetric_edges: Vec<String> = index
        .check_symmetry()
        .into_iter()
        .map(|e| format!("{} -> {} ({:?})", e.source, e.target, e.provenance))
        .collect();
    let report = CheckReport {
        ok: broken_links.is_empty() && asymmetric_edges.is_empty(),
        files: index.stats().files,
        broken_links,
        asymmetric_edges,
    };

    let output = if json {
        to_json(&report)?
    } else {
        let broken_count: usize = report.broken_links.values().map(Vec::len).sum();
        let mut output = format!(
            "Checked {} files: {} broken links, {} asymmetric edges\n",
            report.files,
            broken_count,
            report.asymmetric_edges.len()
        );
        if broken_count > 0 {
            output.push('\n');
            push_list(
                &mut output,
                "Broken links:",
                report
                    .broken_links
                    .iter()
                    .flat_map(|(path, targets)| targets.iter().map(move |t| format!("{}: {}", path, t))),
            );
        }
        if !report.asymmetric_edges.is_empty() {
            output.push('\n');
            push_list(&mut output, "Asymmetric edges:", &report.asymmetric_edges);
        }
        output
    };

    if report.ok {
        Ok(output)
    } else {
        Err(output)
    }
}
