//! Discovery of the project's Django templates.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::Result;

/// Extensions treated as templates
pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["html", "txt"];

/// Result of scanning the template directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateScan {
    /// Template files, sorted per directory
    pub templates: Vec<PathBuf>,
    /// Directories that were scanned
    pub scanned: Vec<PathBuf>,
    /// Directories that could not be scanned, with the reason
    pub errors: Vec<(PathBuf, String)>,
}

/// Collect every `*.html` and `*.txt` file below `dirs`.
///
/// Missing directories and plain files are reported in
/// [`TemplateScan::errors`] instead of failing the scan.
pub fn scan_templates(dirs: &[PathBuf]) -> Result<TemplateScan> {
    let mut scan = TemplateScan::default();

    for dir in dirs {
        if !dir.exists() {
            scan.errors
                .push((dir.clone(), format!("Directory does not exist: {}", dir.display())));
            continue;
        }
        if !dir.is_dir() {
            scan.errors
                .push((dir.clone(), format!("Path is not a directory: {}", dir.display())));
            continue;
        }

        let found = scan_dir(dir, &mut scan)?;
        debug!(dir = %dir.display(), templates = found, "Scanned template directory");
        scan.scanned.push(dir.clone());
    }

    Ok(scan)
}

/// Per-app template directories, `<base_dir>/*/templates`, sorted
pub fn app_template_dirs(base_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*/templates", glob::Pattern::escape(&base_dir.to_string_lossy()));
    let mut dirs = Vec::new();

    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if path.is_dir() => dirs.push(path),
            Ok(_) => {}
            Err(e) => debug!(path = %e.path().display(), error = %e.error(), "Skipping app directory"),
        }
    }

    dirs.sort();
    Ok(dirs)
}

fn scan_dir(dir: &Path, scan: &mut TemplateScan) -> Result<usize> {
    let root = glob::Pattern::escape(&dir.to_string_lossy());
    let mut found = Vec::new();

    for extension in TEMPLATE_EXTENSIONS {
        let pattern = format!("{}/**/*.{}", root, extension);
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => found.push(path),
                Ok(_) => {}
                Err(e) => scan.errors.push((
                    e.path().to_path_buf(),
                    format!("Cannot scan {}: {}", e.path().display(), e.error()),
                )),
            }
        }
    }

    found.sort();
    let count = found.len();
    scan.templates.extend(found);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_finds_html_and_txt() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("templates");
        fs::create_dir_all(root.join("blog/partials")).unwrap();
        fs::write(root.join("base.html"), "").unwrap();
        fs::write(root.join("blog/post.html"), "").unwrap();
        fs::write(root.join("blog/partials/email.txt"), "").unwrap();
        fs::write(root.join("blog/style.css"), "").unwrap();

        let scan = scan_templates(&[root.clone()]).unwrap();
        assert_eq!(
            scan.templates,
            vec![
                root.join("base.html"),
                root.join("blog/partials/email.txt"),
                root.join("blog/post.html"),
            ]
        );
        assert_eq!(scan.scanned, vec![root]);
        assert!(scan.errors.is_empty());
    }

    #[test]
    fn test_missing_and_non_directory_entries_are_reported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir.html");
        fs::write(&file, "").unwrap();
        let missing = dir.path().join("missing");

        let scan = scan_templates(&[missing.clone(), file.clone()]).unwrap();
        assert!(scan.templates.is_empty());
        assert!(scan.scanned.is_empty());
        assert_eq!(scan.errors.len(), 2);
        assert!(scan.errors[0].1.starts_with("Directory does not exist"));
        assert!(scan.errors[1].1.starts_with("Path is not a directory"));
    }

    #[test]
    fn test_app_template_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::create_dir_all(dir.path().join("shop/templates/shop")).unwrap();
        fs::create_dir_all(dir.path().join("blog/templates")).unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/templates"), "").unwrap();

        let dirs = app_template_dirs(dir.path()).unwrap();
        assert_eq!(
            dirs,
            vec![dir.path().join("blog/templates"), dir.path().join("shop/templates")]
        );
    }

    #[test]
    fn test_glob_characters_in_directory_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("[site]");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("index.html"), "").unwrap();

        let scan = scan_templates(&[root.clone()]).unwrap();
        assert_eq!(scan.templates, vec![root.join("index.html")]);
    }
}
