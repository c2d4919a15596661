//! Line-delimited list loading.
//!
//! Source lists carry one domain suffix or CIDR block per line. Lines are
//! trimmed, blank lines dropped, and order and duplicates preserved as-is.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, RuleError};

/// Ordered entries read from one source file.
pub type EntryList = Vec<String>;

/// Load a list file into an [`EntryList`].
///
/// A missing file is not an error: it is logged and yields an empty list so
/// downstream builders still emit a document. Any other I/O failure is
/// returned to the caller.
pub fn load_entries(path: &Path) -> Result<EntryList> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "file not found");
            return Ok(EntryList::new());
        }
        Err(e) => return Err(RuleError::io(path)(e)),
    };

    let entries = parse_entries(&content);
    debug!(path = %path.display(), entries = entries.len(), "loaded list");
    Ok(entries)
}

/// Split list content into trimmed, non-empty lines.
pub fn parse_entries(content: &str) -> EntryList {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests;
