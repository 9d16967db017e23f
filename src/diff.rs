//! Optional review diff attached to the map/init upload.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

/// Well-known diff artifact, looked up in the working directory.
pub const DIFF_FILE_NAME: &str = "diff.json";

/// Load `diff.json` from `workdir`. Absence is silent; unreadable or
/// malformed content logs a warning and is treated as absent.
pub fn load_diff(workdir: &Path) -> Option<Value> {
    let path = workdir.join(DIFF_FILE_NAME);
    if !path.exists() {
        return None;
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(diff) => {
            info!("Loaded diff from: {}", path.display());
            Some(diff)
        }
        Err(e) => {
            warn!("Ignoring malformed {}: {e}", path.display());
            None
        }
    }
}
