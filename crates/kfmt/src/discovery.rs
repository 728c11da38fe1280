//! Source-file discovery for the formatter CLI.
//!
//! Directories are walked recursively for Kotlin sources (`.kt` and `.kts`);
//! hidden directories (names starting with `.`) are skipped. Results are
//! sorted so runs are deterministic.

use std::path::{Path, PathBuf};

/// Whether a path has a Kotlin source extension.
pub fn is_kotlin_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("kt") | Some("kts")
    )
}

/// Recursively discover all Kotlin files under a directory.
pub fn discover_kotlin_files(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    discover_recursive(root, &mut files)
        .map_err(|e| format!("Failed to walk directory '{}': {}", root.display(), e))?;
    files.sort();
    Ok(files)
}

fn discover_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        let file_name = entry.file_name();
        let name_str = file_name.to_string_lossy();

        // Skip hidden directories and files.
        if name_str.starts_with('.') {
            continue;
        }

        if entry_path.is_dir() {
            discover_recursive(&entry_path, files)?;
        } else if is_kotlin_file(&entry_path) {
            files.push(entry_path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn recognizes_kotlin_extensions() {
        assert!(is_kotlin_file(Path::new("a/b.kt")));
        assert!(is_kotlin_file(Path::new("script.kts")));
        assert!(!is_kotlin_file(Path::new("readme.md")));
        assert!(!is_kotlin_file(Path::new("noext")));
    }

    #[test]
    fn discovery_recurses_sorts_and_skips_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        fs::write(root.join("main.kt"), "").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/util.kt"), "").unwrap();
        fs::write(root.join("build.gradle"), "").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/ignored.kt"), "").unwrap();

        let files = discover_kotlin_files(root).unwrap();
        assert_eq!(
            files,
            vec![root.join("main.kt"), root.join("sub/util.kt")]
        );
    }
}
