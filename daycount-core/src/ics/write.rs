//! Writing ICS documents to disk.

use std::path::{Path, PathBuf};

use crate::error::DayCountResult;

/// Filename used when no title-derived name is usable.
pub const DEFAULT_FILE_STEM: &str = "reminder";

/// Write `document` to `path`, forcing an `.ics` extension.
///
/// The parent directory must already exist. Returns the path actually written.
pub fn write_ics(path: &Path, document: &str) -> DayCountResult<PathBuf> {
    let target = ics_path(path);
    std::fs::write(&target, document)?;
    tracing::debug!(path = %target.display(), bytes = document.len(), "wrote ics file");
    Ok(target)
}

/// `path` with `.ics` appended unless it already ends in `.ics` (any case).
pub fn ics_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ics") => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".ics");
            PathBuf::from(name)
        }
    }
}

/// Filename for an event, e.g. `happy-new-year.ics`.
pub fn default_filename(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{DEFAULT_FILE_STEM}.ics")
    } else {
        format!("{slug}.ics")
    }
}

/// Lowercase, alphanumeric runs joined by `-`, at most 50 chars.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50)
        .collect()
}
