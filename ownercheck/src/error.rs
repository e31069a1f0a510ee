use std::{io, path::PathBuf};

use thiserror::Error;

use crate::report::ValidationReport;

#[derive(Debug, Error)]
pub enum ValidationError {
    /// The ownership manifest could not be opened or read. Fatal; no
    /// partial validation is attempted.
    #[error("failed to read ownership manifest {}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A tracked folder could not be enumerated at all. Treating it as
    /// empty would report every rule under it as orphaned, so this is
    /// fatal too.
    #[error("failed to enumerate files under {folder}")]
    FolderUnreadable {
        folder: String,
        #[source]
        source: io::Error,
    },

    /// The manifest and the tracked trees disagree: uncovered files,
    /// orphaned rules, or both. Carries the full diagnostic.
    #[error("{0}")]
    Inconsistent(ValidationReport),
}
