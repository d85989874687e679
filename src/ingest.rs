use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::CoverageDocument;
use crate::parsers::clover;

/// Supplies the raw bytes of a coverage report. `Ok(None)` means there is
/// no report, which is a normal outcome rather than an error.
pub trait ReportSource {
    fn read_report(&self) -> Result<Option<Vec<u8>>>;
}

/// A report on the local filesystem.
pub struct FileReport {
    path: PathBuf,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSource for FileReport {
    fn read_report(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no coverage report");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// An in-memory report, or the lack of one.
impl ReportSource for Option<Vec<u8>> {
    fn read_report(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.clone())
    }
}

/// Read and parse the report. `Ok(None)` when the source has no report.
pub fn load_document(source: &dyn ReportSource) -> Result<Option<CoverageDocument>> {
    let Some(bytes) = source.read_report()? else {
        return Ok(None);
    };
    let doc = clover::parse(&bytes)?;
    tracing::debug!(files = doc.files.len(), bytes = bytes.len(), "parsed coverage report");
    Ok(Some(doc))
}
