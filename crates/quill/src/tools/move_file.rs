use super::{format_update, to_json};
use quill_core::Project;

/// Execute `move`: move a file or tracked directory and rewrite every link to it.
pub fn execute(project: &mut Project, file_path: &str, new_path: &str, json: bool) -> Result<String, String> {
    let result = project
        .move_file(file_path, new_path)
        .map_err(|e| format!("Error: {}", e))?;

    if json {
        return to_json(&result);
    }
    Ok(format_update(&format!("Moved {} -> {}", file_path, new_path), &result))
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fixture;
    use std::fs;

    #[test]
    fn moves_and_reports_updated_files() {
        let (dir, mut project) = fixture::project();
        let output = execute(&mut project, "settings/world.md", "settings/earth.md", false).unwrap();
        assert!(output.starts_with("Moved settings/world.md -> settings/earth.md\n"));
        assert!(output.contains("- contents/ch1.md\n"));
        assert!(output.contains("- contents/.quill-meta.yaml\n"));
        assert_eq!(
            fs::read_to_string(dir.path().join("contents/ch1.md")).unwrap(),
            "See [the world](../settings/earth.md).\n"
        );
    }

    #[test]
    fn moves_directories() {
        let (dir, mut project) = fixture::project();
        let output = execute(&mut project, "settings", "lore", true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["success"], true);
        assert!(dir.path().join("lore/world.md").exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let (_dir, mut project) = fixture::project();
        let err = execute(&mut project, "settings/nope.md", "settings/x.md", false).unwrap_err();
        assert!(err.starts_with("Error: Not found"));
    }

    #[test]
    fn invalid_target_is_rejected() {
        let (_dir, mut project) = fixture::project();
        assert!(execute(&mut project, "settings/world.md", "../out.md", false)
            .unwrap_err()
            .starts_with("Error: Invalid path"));
    }
}
