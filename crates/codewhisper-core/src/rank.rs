//! Ranking of scored candidates.

use crate::models::ScoredFile;

/// Default number of files attached by auto-discovery.
pub const DEFAULT_MAX_FILES: usize = 5;

/// Return the `limit` highest-scoring files, best first.
///
/// The sort is stable: files with equal scores keep the order in which
/// they were discovered. Zero-scored files are not filtered out, so the
/// result length is always `min(limit, files.len())`.
pub fn rank_files(mut files: Vec<ScoredFile>, limit: usize) -> Vec<ScoredFile> {
    files.sort_by(|a, b| b.score.cmp(&a.score));
    files.truncate(limit);
    files
}
