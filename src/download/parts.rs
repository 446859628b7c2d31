//! Multi-part naming and size-based resume

use std::path::{Path, PathBuf};
use tracing::debug;

/// `video.flv` -> `video.part02_of_05.flv`; unchanged when `count <= 1`
pub fn part_target(base: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return base.to_path_buf();
    }

    let suffix = format!("part{:02}_of_{:02}", index, count);
    let file_name = base
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("video");

    let renamed = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}.{}.{}", stem, suffix, ext),
        _ => format!("{}.{}", file_name, suffix),
    };

    base.with_file_name(renamed)
}

/// True when `path` already holds exactly `expected` bytes
///
/// Content is not verified; a file of any other size is fetched again.
pub async fn is_complete(path: &Path, expected: Option<u64>) -> bool {
    let Some(expected) = expected else {
        return false;
    };

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {
            let complete = meta.len() == expected;
            debug!(
                path = %path.display(),
                actual = meta.len(),
                expected,
                complete,
                "Checked existing part"
            );
            complete
        }
        _ => false,
    }
}
