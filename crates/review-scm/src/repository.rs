use serde::{Deserialize, Serialize};

/// A repository configuration record as stored by the review platform.
///
/// All fields are opaque pass-through strings from the platform's
/// repository form; backends interpret only `path` and the credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Repository {
    /// Local filesystem path or HTTP URL of the repository source.
    pub path: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Preferred text encoding for file content, if any.
    #[serde(default)]
    pub encoding: Option<String>,

    /// Isolation scope within the platform; passed through, never
    /// interpreted by backends.
    #[serde(default)]
    pub local_site: Option<String>,
}

impl Repository {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}
