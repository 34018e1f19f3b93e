use std::sync::Arc;

use crate::error::ScmError;
use crate::revision::Revision;

/// A source-control backend as seen by the review platform.
///
/// Tools translate the platform's uniform repository contract into
/// backend-specific operations. The platform calls these while rendering
/// diffs, so every method must be safe to invoke repeatedly.
#[async_trait::async_trait]
pub trait ScmTool: Send + Sync {
    /// Registry name of this backend.
    fn name(&self) -> &str;

    /// Fetch the raw content of `path` at `revision`.
    async fn get_file(&self, path: &str, revision: &Revision) -> Result<Vec<u8>, ScmError>;

    /// Whether `path` exists at `revision`.
    async fn file_exists(&self, path: &str, revision: &Revision) -> Result<bool, ScmError>;

    /// Map a (file, revision) pair from a diff header onto the backend's
    /// revision model.
    fn parse_diff_revision(
        &self,
        file_str: &str,
        revision_str: &str,
    ) -> Result<(String, Revision), ScmError>;

    /// Whether paths in uploaded diffs are absolute within the repository.
    fn diffs_use_absolute_paths(&self) -> bool {
        false
    }

    /// Names of the diff-related upload fields this backend accepts.
    fn fields(&self) -> &[&str] {
        &["diff_path"]
    }
}

#[async_trait::async_trait]
impl<T: ScmTool + ?Sized> ScmTool for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn get_file(&self, path: &str, revision: &Revision) -> Result<Vec<u8>, ScmError> {
        (**self).get_file(path, revision).await
    }

    async fn file_exists(&self, path: &str, revision: &Revision) -> Result<bool, ScmError> {
        (**self).file_exists(path, revision).await
    }

    fn parse_diff_revision(
        &self,
        file_str: &str,
        revision_str: &str,
    ) -> Result<(String, Revision), ScmError> {
        (**self).parse_diff_revision(file_str, revision_str)
    }

    fn diffs_use_absolute_paths(&self) -> bool {
        (**self).diffs_use_absolute_paths()
    }

    fn fields(&self) -> &[&str] {
        (**self).fields()
    }
}
