use crate::revision::Revision;

/// Errors surfaced by SCM backends to the review platform.
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    #[error("file not found: {path} (revision {revision})")]
    FileNotFound { path: String, revision: Revision },

    #[error("invalid revision format: {0}")]
    InvalidRevisionFormat(String),

    #[error("repository not found")]
    RepositoryNotFound,

    /// Generic transport or archive failure with a human-readable message.
    #[error("{0}")]
    Scm(String),

    /// The backend's environment is unusable. Raised once at construction,
    /// never per call.
    #[error("setup error: {0}")]
    Setup(String),
}
