use std::path::PathBuf;

use review_scm::{Repository, Revision, ScmError, ScmTool};

use crate::client::TarballClient;

/// Tarball backend for the review platform.
///
/// Serves file content out of a single tar archive, local or remote over
/// plain HTTP. There is no version history; revisions are opaque except
/// for the pre-creation sentinel.
pub struct TarballTool {
    client: TarballClient,
}

impl TarballTool {
    pub fn new(repository: &Repository, cache_dir: impl Into<PathBuf>) -> Result<Self, ScmError> {
        let client = TarballClient::new(
            &repository.path,
            repository.username.clone(),
            repository.password.clone(),
            cache_dir,
        )?;

        Ok(Self { client })
    }

    /// Probe a repository path for validity without keeping a tool around.
    ///
    /// A connectivity/validity check only: returns
    /// [`ScmError::RepositoryNotFound`] unless the path resolves to an
    /// archive that exists and opens cleanly.
    pub async fn check_repository(
        path: &str,
        username: Option<&str>,
        password: Option<&str>,
        _local_site: Option<&str>,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<(), ScmError> {
        let client = TarballClient::new(
            path,
            username.map(str::to_owned),
            password.map(str::to_owned),
            cache_dir,
        )?;

        if !client.is_valid_repository().await {
            return Err(ScmError::RepositoryNotFound);
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ScmTool for TarballTool {
    fn name(&self) -> &str {
        "Tarball"
    }

    async fn get_file(&self, path: &str, revision: &Revision) -> Result<Vec<u8>, ScmError> {
        if revision.is_pre_creation() {
            // Platform convention: a pre-creation file renders as added,
            // with empty original content.
            return Ok(Vec::new());
        }

        self.client.get_file(path, revision).await
    }

    async fn file_exists(&self, path: &str, revision: &Revision) -> Result<bool, ScmError> {
        if revision.is_pre_creation() {
            return Ok(false);
        }

        Ok(self.client.get_file_exists(path, revision).await)
    }

    fn parse_diff_revision(
        &self,
        file_str: &str,
        revision_str: &str,
    ) -> Result<(String, Revision), ScmError> {
        // Diff convention: /dev/null marks a file that did not exist on
        // this side.
        let revision = if file_str == "/dev/null" {
            Revision::PreCreation
        } else {
            Revision::opaque(revision_str)
        };

        Ok((file_str.to_owned(), revision))
    }

    fn diffs_use_absolute_paths(&self) -> bool {
        true
    }

    fn fields(&self) -> &[&str] {
        &["diff_path", "parent_diff_path"]
    }
}
