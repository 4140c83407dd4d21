//! Recursive code file discovery.
//!
//! Walks a directory tree with `walkdir`, pruning ignored directory names
//! and keeping only files whose extension is on the allow-list. The root
//! directory is depth 0; a file lives at the depth of the directory that
//! contains it, and files in directories deeper than `max_depth` are left
//! out without error.
//!
//! Entries are visited sorted by file name so the discovery order (which
//! the ranker uses to break ties) is deterministic.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use codewhisper_core::models::CandidateFile;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::DiscoveryConfig;

/// Scanner settings, decoupled from the TOML config.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub ignored_dirs: HashSet<String>,
    pub extensions: HashSet<String>,
    pub follow_symlinks: bool,
}

impl ScanOptions {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            ignored_dirs: config.ignored_dirs.iter().cloned().collect(),
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
            follow_symlinks: config.follow_symlinks,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

/// List recognized code files under `root`.
///
/// Unreadable directories are logged and skipped; a root with no matching
/// files (or no root at all) yields an empty list.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Vec<CandidateFile> {
    if !root.is_dir() {
        warn!(root = %root.display(), "scan root is not a readable directory");
        return Vec::new();
    }

    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        // Files sit one level below their directory.
        .max_depth(options.max_depth.saturating_add(1))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry, options));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let location = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                warn!(path = %location, error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(candidate) = to_candidate(root, entry.path(), options) {
            files.push(candidate);
        }
    }

    debug!(root = %root.display(), count = files.len(), "scan complete");
    files
}

/// Async wrapper running [`scan_directory`] on the blocking thread pool.
pub async fn scan_directory_async(root: &Path, options: &ScanOptions) -> Result<Vec<CandidateFile>> {
    let root = root.to_path_buf();
    let options = options.clone();
    let files = tokio::task::spawn_blocking(move || scan_directory(&root, &options)).await?;
    Ok(files)
}

fn is_ignored_dir(entry: &DirEntry, options: &ScanOptions) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && options
            .ignored_dirs
            .contains(entry.file_name().to_string_lossy().as_ref())
}

fn to_candidate(root: &Path, path: &Path, options: &ScanOptions) -> Option<CandidateFile> {
    let extension = path.extension()?.to_string_lossy().to_lowercase();
    if !options.extensions.contains(&extension) {
        return None;
    }
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    Some(CandidateFile {
        path: path.to_path_buf(),
        relative,
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn relatives(files: &[CandidateFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_filters_by_extension() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "main.rs");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "image.png");
        touch(tmp.path(), "README.MD");

        let files = scan_directory(tmp.path(), &ScanOptions::default());
        assert_eq!(relatives(&files), vec!["README.MD", "main.rs"]);
        assert_eq!(files[0].extension, "md");
    }

    #[test]
    fn test_prunes_ignored_dirs_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/app.ts");
        touch(tmp.path(), "node_modules/lib/index.js");
        touch(tmp.path(), "src/node_modules/dep.js");
        touch(tmp.path(), ".git/config.json");

        let files = scan_directory(tmp.path(), &ScanOptions::default());
        assert_eq!(relatives(&files), vec!["src/app.ts"]);
    }

    #[test]
    fn test_ignore_is_exact_name_match() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "builder/make.py");
        touch(tmp.path(), "build/out.js");

        let files = scan_directory(tmp.path(), &ScanOptions::default());
        assert_eq!(relatives(&files), vec!["builder/make.py"]);
    }

    #[test]
    fn test_depth_bound() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "root.rs");
        touch(tmp.path(), "a/one.rs");
        touch(tmp.path(), "a/b/two.rs");
        touch(tmp.path(), "a/b/c/three.rs");
        touch(tmp.path(), "a/b/c/d/four.rs");

        let options = ScanOptions {
            max_depth: 3,
            ..ScanOptions::default()
        };
        let files = scan_directory(tmp.path(), &options);
        assert_eq!(
            relatives(&files),
            vec!["a/b/c/three.rs", "a/b/two.rs", "a/one.rs", "root.rs"]
        );

        let shallow = ScanOptions {
            max_depth: 0,
            ..ScanOptions::default()
        };
        assert_eq!(relatives(&scan_directory(tmp.path(), &shallow)), vec!["root.rs"]);
    }

    #[test]
    fn test_unbounded_depth_keeps_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "main.rs");
        touch(tmp.path(), "a/b/c/d/e/deep.rs");

        let options = ScanOptions {
            max_depth: usize::MAX,
            ..ScanOptions::default()
        };
        let files = scan_directory(tmp.path(), &options);
        assert_eq!(relatives(&files), vec!["a/b/c/d/e/deep.rs", "main.rs"]);
    }

    #[test]
    fn test_empty_tree_is_empty_result() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.jpg");
        assert!(scan_directory(tmp.path(), &ScanOptions::default()).is_empty());
    }

    #[test]
    fn test_missing_root_is_empty_result() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(scan_directory(&missing, &ScanOptions::default()).is_empty());
    }

    #[tokio::test]
    async fn test_async_scan_matches_sync() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "x/y.go");
        let files = scan_directory_async(tmp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(relatives(&files), vec!["x/y.go"]);
    }
}
