//! Path helpers

use std::path::PathBuf;

/// Expand a leading `~` to the home directory.
///
/// Other paths are returned as given; relative paths stay relative so the
/// file store resolves them against the working directory at open time.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(path)
}
