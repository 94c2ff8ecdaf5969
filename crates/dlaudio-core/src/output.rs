//! Locating the converted file and normalizing its extension

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension every finished download ends up with
pub const CANONICAL_EXTENSION: &str = "m4a";

/// Extensions yt-dlp may leave behind, probed in order
pub const CANDIDATE_EXTENSIONS: [&str; 4] = ["m4a", "mp4", "webm", "opus"];

/// `<base>.<ext>` without touching dots already present in the title
pub fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// Find the downloaded file for `base` and rename it to `<base>.m4a`.
///
/// Returns `Ok(None)` when no candidate exists; the caller then skips tagging.
pub fn resolve_output(base: &Path) -> io::Result<Option<PathBuf>> {
    let canonical = with_extension(base, CANONICAL_EXTENSION);
    if canonical.exists() {
        return Ok(Some(canonical));
    }

    let Some(found) = CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| with_extension(base, ext))
        .find(|candidate| candidate.exists())
    else {
        debug!("No output file found for base: {}", base.display());
        return Ok(None);
    };

    if found != canonical {
        info!("Renaming {} -> {}", found.display(), canonical.display());
        std::fs::rename(&found, &canonical)?;
    }
    Ok(Some(canonical))
}
