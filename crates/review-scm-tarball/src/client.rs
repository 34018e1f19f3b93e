use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use flate2::read::GzDecoder;
use tracing::{debug, error};

use review_scm::{Revision, ScmError};

/// Client owning a single tarball's retrieval and extraction.
///
/// The source may be a local path (`file://`) or a remote URL (`http://`).
/// Remote sources are downloaded once into the cache directory, keyed by
/// the URL basename, and read from disk afterward. A cached copy is never
/// refreshed while it exists on disk.
pub struct TarballClient {
    path: String,
    username: Option<String>,
    password: Option<String>,
    cache_dir: PathBuf,
    local_path: PathBuf,
    client: reqwest::Client,
}

impl TarballClient {
    /// Build a client for one tarball source.
    ///
    /// `path` is normalized to carry an explicit scheme. The cache
    /// directory must exist or be creatable; an unusable cache directory
    /// is a [`ScmError::Setup`] here rather than a failure on first use.
    pub fn new(
        path: &str,
        username: Option<String>,
        password: Option<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, ScmError> {
        let cache_dir = cache_dir.into();

        fs::create_dir_all(&cache_dir).map_err(|e| {
            ScmError::Setup(format!(
                "cache directory {} is unusable: {e}",
                cache_dir.display()
            ))
        })?;

        let path = normalize_tarball_url(path);

        let local_path = match path.strip_prefix("file://") {
            Some(local) => PathBuf::from(local),
            None => {
                let basename = path.rsplit('/').next().unwrap_or(path.as_str());
                cache_dir.join(basename)
            }
        };

        Ok(Self {
            path,
            username,
            password,
            cache_dir,
            local_path,
            client: reqwest::Client::new(),
        })
    }

    /// The normalized source reference.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Where the archive lives (or will live) on the local filesystem.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    fn is_remote(&self) -> bool {
        self.path.starts_with("http://")
    }

    /// Check that the source resolves to an archive that exists and opens
    /// cleanly. Fetch failures for remote sources are logged and reported
    /// as `false`, never propagated.
    pub async fn is_valid_repository(&self) -> bool {
        if self.is_remote() {
            if let Err(err) = self.fill_cache().await {
                error!(source = %self.path, %err, "cannot cache remote tarball");
                return false;
            }
        }

        if !self.local_path.exists() {
            error!(archive = %self.local_path.display(), "cannot find local archive");
            return false;
        }

        self.validate_archive()
    }

    /// Ensure the remote tarball has a local copy in the cache directory.
    ///
    /// No-op when a cached copy already exists. A 404 from the source maps
    /// to [`ScmError::FileNotFound`] carrying the source URL; any other
    /// HTTP status or transport failure maps to [`ScmError::Scm`].
    pub async fn fill_cache(&self) -> Result<(), ScmError> {
        if self.local_path.exists() {
            // TODO: compare checksums and re-download when the cached copy
            // no longer matches the remote.
            debug!(archive = %self.local_path.display(), "already cached");
            return Ok(());
        }

        let mut req = self.client.get(&self.path);

        if let Some(username) = &self.username {
            let password = self.password.as_deref().unwrap_or("");
            let auth = base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{password}"));
            req = req.header("Authorization", format!("Basic {auth}"));
        }

        let response = req.send().await.map_err(|e| {
            let msg = format!("unexpected error fetching tarball from {}: {e}", self.path);
            error!("{msg}");
            ScmError::Scm(msg)
        })?;

        if response.status().as_u16() == 404 {
            error!(source = %self.path, "remote tarball returned 404");
            return Err(ScmError::FileNotFound {
                path: self.path.clone(),
                revision: Revision::Head,
            });
        }

        if !response.status().is_success() {
            let msg = format!(
                "HTTP {} when fetching tarball from {}",
                response.status(),
                self.path
            );
            error!("{msg}");
            return Err(ScmError::Scm(msg));
        }

        let bytes = response.bytes().await.map_err(|e| {
            let msg = format!("failed to read tarball body from {}: {e}", self.path);
            error!("{msg}");
            ScmError::Scm(msg)
        })?;

        self.write_cache_entry(&bytes)
    }

    /// Extract the raw bytes of one archive member.
    ///
    /// The archive is opened per call; no handle persists between reads.
    pub async fn get_file(&self, path: &str, revision: &Revision) -> Result<Vec<u8>, ScmError> {
        if self.is_remote() {
            self.fill_cache().await?;
        }

        let mut archive = open_archive(&self.local_path).map_err(|e| {
            ScmError::Scm(format!(
                "cannot open archive {}: {e}",
                self.local_path.display()
            ))
        })?;

        let entries = archive
            .entries()
            .map_err(|e| ScmError::Scm(format!("cannot read archive entries: {e}")))?;

        for entry in entries {
            let mut entry =
                entry.map_err(|e| ScmError::Scm(format!("cannot read archive entry: {e}")))?;

            let is_match = entry
                .path()
                .map_err(|e| ScmError::Scm(format!("invalid path in archive: {e}")))?
                .as_ref()
                == Path::new(path);

            if is_match {
                let mut content = Vec::new();
                entry
                    .read_to_end(&mut content)
                    .map_err(|e| ScmError::Scm(format!("cannot extract {path}: {e}")))?;
                return Ok(content);
            }
        }

        error!(member = path, source = %self.path, "member not found in archive");
        Err(ScmError::FileNotFound {
            path: path.to_owned(),
            revision: revision.clone(),
        })
    }

    /// Total existence predicate: any extraction failure at all, not only a
    /// missing member, reads as "does not exist". Never returns an error;
    /// callers rely on this being usable as a pure predicate.
    pub async fn get_file_exists(&self, path: &str, revision: &Revision) -> bool {
        self.get_file(path, revision).await.is_ok()
    }

    fn validate_archive(&self) -> bool {
        if read_first_entry(&self.local_path).is_ok() {
            return true;
        }

        debug!(archive = %self.local_path.display(), "not a valid archive");

        // Drop corrupt downloads so the next probe re-fetches. Direct
        // file:// paths are the caller's files and are left alone.
        if self.local_path.starts_with(&self.cache_dir) {
            let _ = fs::remove_file(&self.local_path);
        }

        false
    }

    fn write_cache_entry(&self, bytes: &[u8]) -> Result<(), ScmError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir).map_err(|e| {
            ScmError::Scm(format!(
                "cannot create temporary file in {}: {e}",
                self.cache_dir.display()
            ))
        })?;

        tmp.write_all(bytes).map_err(|e| {
            ScmError::Scm(format!("cannot write cache entry: {e}"))
        })?;

        // Rename into place so a concurrent reader never sees a partial
        // download.
        tmp.persist(&self.local_path).map_err(|e| {
            ScmError::Scm(format!(
                "cannot persist cache entry {}: {e}",
                self.local_path.display()
            ))
        })?;

        Ok(())
    }
}

/// Open a tar archive, transparently handling gzip compression.
fn open_archive(path: &Path) -> std::io::Result<tar::Archive<Box<dyn Read>>> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    file.rewind()?;

    let reader: Box<dyn Read> = if n == 2 && magic == [0x1f, 0x8b] {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(tar::Archive::new(reader))
}

/// Reading the first header is enough to reject non-tar content; an empty
/// archive with zero entries is still valid.
fn read_first_entry(path: &Path) -> std::io::Result<()> {
    let mut archive = open_archive(path)?;
    let mut entries = archive.entries()?;

    if let Some(entry) = entries.next() {
        entry?;
    }

    Ok(())
}

/// Normalize a repository reference to always carry an explicit scheme.
/// Recognized schemes pass through unchanged; anything else is assumed to
/// be a bare local filesystem path.
fn normalize_tarball_url(path: &str) -> String {
    if path.starts_with("file://") || path.starts_with("http://") {
        path.to_owned()
    } else {
        format!("file://{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_paths_gain_a_file_scheme() {
        assert_eq!(normalize_tarball_url("/a/b"), "file:///a/b");
    }

    #[test]
    fn normalization_is_idempotent() {
        assert_eq!(normalize_tarball_url("file:///a/b"), "file:///a/b");
        assert_eq!(
            normalize_tarball_url("http://example.com/a.tar"),
            "http://example.com/a.tar"
        );
        assert_eq!(
            normalize_tarball_url(&normalize_tarball_url("/a/b")),
            "file:///a/b"
        );
    }

    #[test]
    fn remote_sources_cache_by_basename() {
        let client = TarballClient::new(
            "http://example.com/archives/src.tar.gz",
            None,
            None,
            std::env::temp_dir(),
        )
        .unwrap();

        assert_eq!(
            client.local_path(),
            std::env::temp_dir().join("src.tar.gz")
        );
    }

    #[test]
    fn file_sources_bypass_the_cache() {
        let client =
            TarballClient::new("file:///data/src.tar", None, None, std::env::temp_dir()).unwrap();

        assert_eq!(client.local_path(), Path::new("/data/src.tar"));
        assert_eq!(client.path(), "file:///data/src.tar");
    }
}
