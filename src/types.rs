use crate::error::ReadFailure;
use std::path::{Path, PathBuf};

/// A file that existed and passed the filters when the tree was walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPath {
    path: PathBuf,
    display: String,
}

impl DiscoveredPath {
    pub(crate) fn new(path: PathBuf, display: String) -> Self {
        Self { path, display }
    }

    /// Where the file lives: the scan root joined with its relative path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the file is named in the summary.
    pub fn display_path(&self) -> &str {
        &self.display
    }
}

/// One file's contribution to the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub display_path: String,
    /// The decoded text, or why there is none.
    pub content: Result<String, ReadFailure>,
    /// Name of the encoding the text was decoded with.
    pub encoding: Option<&'static str>,
    /// Whether invalid sequences were replaced with U+FFFD.
    pub lossy: bool,
}

impl FileRecord {
    /// A UTF-8 text record, as produced for a clean read.
    pub fn new(display_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self::decoded(display_path.into(), text.into(), "UTF-8", false)
    }

    pub(crate) fn decoded(
        display_path: String,
        text: String,
        encoding: &'static str,
        lossy: bool,
    ) -> Self {
        Self {
            display_path,
            content: Ok(text),
            encoding: Some(encoding),
            lossy,
        }
    }

    pub fn failed(display_path: impl Into<String>, failure: ReadFailure) -> Self {
        Self {
            display_path: display_path.into(),
            content: Err(failure),
            encoding: None,
            lossy: false,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.content.is_err()
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateReport {
    /// Blocks written, one per discovered file.
    pub files: usize,
    /// How many of those blocks carry an error line instead of content.
    pub failures: usize,
    /// The summary path, or `None` when nothing matched and no file was created.
    pub output: Option<PathBuf>,
}
