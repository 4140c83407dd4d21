//! Loading file contents into context messages.
//!
//! Files are read concurrently and rendered as `File: <path>` blocks. A file
//! that cannot be read is replaced by a placeholder line and a warning; it
//! never fails the whole batch.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Render the given files as one context block.
///
/// Returns `None` when `paths` is empty.
pub async fn load_files(paths: &[PathBuf]) -> Option<String> {
    if paths.is_empty() {
        return None;
    }

    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| tokio::spawn(async move { render_file(&path).await }))
        .collect();

    let mut blocks = Vec::with_capacity(handles.len());
    for (handle, path) in handles.into_iter().zip(paths) {
        match handle.await {
            Ok(block) => blocks.push(block),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file loading task failed");
                blocks.push(unreadable_placeholder(path));
            }
        }
    }

    Some(blocks.join("\n\n"))
}

async fn render_file(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => format!(
            "File: {}\n\n{}",
            path.display(),
            String::from_utf8_lossy(&bytes)
        ),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read file");
            unreadable_placeholder(path)
        }
    }
}

fn unreadable_placeholder(path: &Path) -> String {
    format!("Could not read file: {}", path.display())
}

/// Priming message for the files attached at the start of a session.
pub fn code_context_message(files: &str) -> String {
    format!("Code context:\n```\n{}\n```", files)
}

/// Message for a file added with the `file:` command.
pub fn added_file_message(files: &str) -> String {
    format!("Adding file to context:\n```\n{}\n```", files)
}

/// Message for files added with the `auto:` command.
pub fn discovered_files_message(files: &str) -> String {
    format!("Adding discovered files to context:\n```\n{}\n```", files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_paths() {
        assert!(load_files(&[]).await.is_none());
    }

    #[tokio::test]
    async fn test_renders_files_in_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.rs");
        let b = tmp.path().join("b.rs");
        fs::write(&a, "fn a() {}").unwrap();
        fs::write(&b, "fn b() {}").unwrap();

        let out = load_files(&[a.clone(), b.clone()]).await.unwrap();
        let expected = format!(
            "File: {}\n\nfn a() {{}}\n\nFile: {}\n\nfn b() {{}}",
            a.display(),
            b.display()
        );
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_unreadable_file_gets_placeholder() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.py");
        let missing = tmp.path().join("missing.py");
        fs::write(&good, "print('ok')").unwrap();

        let out = load_files(&[missing.clone(), good]).await.unwrap();
        assert!(out.starts_with(&format!("Could not read file: {}", missing.display())));
        assert!(out.contains("print('ok')"));
    }

    #[test]
    fn test_context_message_wraps_in_fence() {
        assert_eq!(code_context_message("x"), "Code context:\n```\nx\n```");
    }
}
