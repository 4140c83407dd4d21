//! Automatic context discovery.
//!
//! Pipeline: scan the tree → extract prompt keywords → score every
//! candidate → rank and keep the top `max_files`.
//!
//! Scoring spawns one task per candidate but holds a semaphore permit while
//! a file is open, so at most `max_open_files` handles are open at once.
//! Results are collected in discovery order before ranking, which keeps
//! tie-breaking stable.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use codewhisper_core::keywords::{extract_keywords, KeywordSet};
use codewhisper_core::models::{CandidateFile, ScoredFile};
use codewhisper_core::rank::rank_files;
use codewhisper_core::score::score_file;
use tokio::io::AsyncReadExt;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::scanner::{scan_directory_async, ScanOptions};

/// Inputs for one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub prompt: String,
    pub base_path: PathBuf,
    pub max_files: usize,
    pub scan: ScanOptions,
    pub max_open_files: usize,
    pub content_window: usize,
}

impl DiscoveryRequest {
    /// Build a request from config defaults.
    pub fn new(prompt: &str, base_path: &Path, config: &DiscoveryConfig) -> Self {
        Self {
            prompt: prompt.to_string(),
            base_path: base_path.to_path_buf(),
            max_files: config.max_files,
            scan: ScanOptions::from_config(config),
            max_open_files: config.max_open_files,
            content_window: config.content_window,
        }
    }
}

/// Find the files most relevant to the prompt, best first.
///
/// An empty result means the tree had no recognized code files; it is up
/// to the caller whether that is an error.
pub async fn discover_files(request: &DiscoveryRequest) -> Result<Vec<ScoredFile>> {
    let candidates = scan_directory_async(&request.base_path, &request.scan).await?;
    if candidates.is_empty() {
        debug!(base = %request.base_path.display(), "no candidate files found");
        return Ok(Vec::new());
    }

    let keywords = Arc::new(extract_keywords(&request.prompt));
    debug!(keywords = ?keywords, candidates = candidates.len(), "scoring candidates");

    let scored = score_candidates(
        candidates,
        keywords,
        request.max_open_files,
        request.content_window,
    )
    .await?;

    Ok(rank_files(scored, request.max_files))
}

/// `codewhisper discover`: print `score  path` lines, best first.
pub async fn run_discover(request: &DiscoveryRequest) -> Result<()> {
    let found = discover_files(request).await?;
    if found.is_empty() {
        println!("No files found.");
        return Ok(());
    }
    for file in &found {
        println!("{:>6}  {}", file.score, file.relative.display());
    }
    Ok(())
}

/// Score candidates concurrently, returning results in input order.
pub async fn score_candidates(
    candidates: Vec<CandidateFile>,
    keywords: Arc<KeywordSet>,
    max_open_files: usize,
    content_window: usize,
) -> Result<Vec<ScoredFile>> {
    score_candidates_with(
        candidates,
        keywords,
        max_open_files,
        content_window,
        read_preview,
    )
    .await
}

/// [`score_candidates`] with the file reader supplied by the caller.
///
/// `read` runs only while its task holds a permit, so at most
/// `max_open_files` reads are in flight at once.
async fn score_candidates_with<R, Fut>(
    candidates: Vec<CandidateFile>,
    keywords: Arc<KeywordSet>,
    max_open_files: usize,
    content_window: usize,
    read: R,
) -> Result<Vec<ScoredFile>>
where
    R: Fn(PathBuf, usize) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = std::io::Result<String>> + Send + 'static,
{
    let limiter = Arc::new(Semaphore::new(max_open_files.max(1)));

    let handles: Vec<_> = candidates
        .into_iter()
        .map(|candidate| {
            let limiter = limiter.clone();
            let keywords = keywords.clone();
            let read = read.clone();
            tokio::spawn(async move {
                if keywords.is_empty() {
                    return anyhow::Ok(ScoredFile::new(&candidate, 0));
                }
                let _permit = limiter.acquire_owned().await?;
                let content = read(candidate.path.clone(), content_window).await;
                let score = score_read(&candidate, &keywords, content_window, content);
                anyhow::Ok(ScoredFile::new(&candidate, score))
            })
        })
        .collect();

    let mut scored = Vec::with_capacity(handles.len());
    for handle in handles {
        scored.push(handle.await??);
    }
    Ok(scored)
}

/// Score a single file. Unreadable files score zero and log a warning.
pub async fn score_candidate(
    candidate: &CandidateFile,
    keywords: &KeywordSet,
    content_window: usize,
) -> u64 {
    if keywords.is_empty() {
        return 0;
    }
    let content = read_preview(candidate.path.clone(), content_window).await;
    score_read(candidate, keywords, content_window, content)
}

fn score_read(
    candidate: &CandidateFile,
    keywords: &KeywordSet,
    content_window: usize,
    content: std::io::Result<String>,
) -> u64 {
    match content {
        Ok(content) => score_file(&candidate.relative, &content, keywords, content_window).total(),
        Err(e) => {
            warn!(path = %candidate.path.display(), error = %e, "could not read file for scoring");
            0
        }
    }
}

/// Read enough leading bytes to cover `window` characters, decoded lossily.
async fn read_preview(path: PathBuf, window: usize) -> std::io::Result<String> {
    // UTF-8 encodes a character in at most four bytes.
    let limit = window.saturating_mul(4) as u64;
    let file = tokio::fs::File::open(&path).await?;
    let mut buf = Vec::new();
    file.take(limit).read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn candidate(root: &Path, rel: &str) -> CandidateFile {
        CandidateFile {
            path: root.join(rel),
            relative: PathBuf::from(rel),
            extension: "ts".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_scores_zero() {
        let tmp = TempDir::new().unwrap();
        let keywords = extract_keywords("login flow");
        let missing = candidate(tmp.path(), "auth/login.ts");
        assert_eq!(score_candidate(&missing, &keywords, 10_000).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_still_scored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.ts");
        let mut bytes = vec![0xff, 0xfe];
        bytes.extend_from_slice(b" login ");
        fs::write(&path, bytes).unwrap();

        let keywords = extract_keywords("login");
        let c = candidate(tmp.path(), "blob.ts");
        assert_eq!(score_candidate(&c, &keywords, 10_000).await, 1);
    }

    #[tokio::test]
    async fn test_score_candidates_keeps_input_order() {
        let tmp = TempDir::new().unwrap();
        let mut candidates = Vec::new();
        for i in 0..40 {
            let rel = format!("f{:02}.ts", i);
            fs::write(tmp.path().join(&rel), "token ".repeat(i)).unwrap();
            candidates.push(candidate(tmp.path(), &rel));
        }

        let keywords = Arc::new(extract_keywords("token"));
        let scored = score_candidates(candidates, keywords, 3, 10_000).await.unwrap();
        let scores: Vec<u64> = scored.iter().map(|s| s.score).collect();
        let expected: Vec<u64> = (0..40).collect();
        assert_eq!(scores, expected);
    }

    #[tokio::test]
    async fn test_open_files_never_exceed_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let reader = {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            move |_path: PathBuf, _window: usize| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let open = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(open, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>("token".to_string())
                }
            }
        };

        let root = Path::new("/virtual");
        let candidates: Vec<CandidateFile> = (0..50)
            .map(|i| candidate(root, &format!("f{:02}.ts", i)))
            .collect();
        let keywords = Arc::new(extract_keywords("token"));

        let scored = score_candidates_with(candidates, keywords, 4, 10_000, reader)
            .await
            .unwrap();

        assert_eq!(scored.len(), 50);
        assert!(scored.iter().all(|s| s.score == 1));
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "{} reads were in flight at once", peak);
        assert!(peak > 1, "reads never overlapped");
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }
}
