use std::fmt;

/// A revision identifier as understood by the review platform.
///
/// Backends without real version history (such as tarballs) treat
/// non-sentinel revisions as opaque pass-through strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Revision {
    /// The file does not exist yet on this side of a diff.
    PreCreation,
    /// The latest content the backend can serve.
    Head,
    /// An opaque revision string whose meaning is backend-specific.
    Opaque(String),
}

impl Revision {
    pub fn opaque(revision: impl Into<String>) -> Self {
        Self::Opaque(revision.into())
    }

    pub fn is_pre_creation(&self) -> bool {
        matches!(self, Self::PreCreation)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreCreation => f.write_str("PRE-CREATION"),
            Self::Head => f.write_str("HEAD"),
            Self::Opaque(revision) => f.write_str(revision),
        }
    }
}
