//! Restrict a parsed report to the files touched by a change-set.

use std::path::Path;

use crate::changes::ChangeSet;
use crate::model::{CoverageDocument, FileRecord};

/// A report record paired with its repository-relative path.
#[derive(Debug, Clone, Copy)]
pub struct MatchedFile<'a> {
    pub path: &'a str,
    pub record: &'a FileRecord,
}

/// Records of the report that matter for this review, in document order.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    pub files: Vec<MatchedFile<'a>>,
}

impl Selection<'_> {
    /// Number of files that are both covered by the report and changed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Strip `root` from an absolute report path. Paths outside `root`, and
/// already-relative paths, are returned unchanged.
pub fn normalize_path<'a>(path: &'a str, root: &Path) -> &'a str {
    if root.as_os_str().is_empty() {
        return path;
    }
    match Path::new(path).strip_prefix(root) {
        Ok(rel) => rel.to_str().unwrap_or(path),
        Err(_) => path,
    }
}

/// Select the records whose normalized path is in the change-set. With
/// `show_all` every record is selected.
pub fn select<'a>(
    doc: &'a CoverageDocument,
    changes: &ChangeSet,
    root: &Path,
    show_all: bool,
) -> Selection<'a> {
    let files = doc
        .files
        .iter()
        .map(|record| MatchedFile {
            path: normalize_path(&record.path, root),
            record,
        })
        .filter(|m| show_all || changes.contains(m.path))
        .collect::<Vec<_>>();

    tracing::debug!(
        report_files = doc.files.len(),
        selected = files.len(),
        show_all,
        "filtered report against change-set"
    );

    Selection { files }
}
