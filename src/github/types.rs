use serde::{Deserialize, Serialize};

/// Kind of an entry in a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory that can be listed further
    Directory,
    /// Symlink or submodule; never fetched
    Other,
}

impl EntryKind {
    /// Maps the `type` field of the contents API
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "file" => Self::File,
            "dir" => Self::Directory,
            _ => Self::Other,
        }
    }
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Full path within the repository (e.g. `src/lib.rs`)
    pub path: String,
    /// Last path component
    pub name: String,
    /// File, directory or something else
    pub kind: EntryKind,
}

impl TreeEntry {
    /// Builds a file entry from its full path
    pub fn file(path: impl Into<String>) -> Self {
        Self::with_kind(path, EntryKind::File)
    }

    /// Builds a directory entry from its full path
    pub fn dir(path: impl Into<String>) -> Self {
        Self::with_kind(path, EntryKind::Directory)
    }

    fn with_kind(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { path, name, kind }
    }
}

/// Raw payload the hosting API returns for a file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBytes {
    /// Decoded bytes of a single blob
    Blob(Vec<u8>),
    /// The API answered with a list of this many parts instead of a blob
    Parts(usize),
    /// The blob exists but the API did not inline its content
    TooLarge {
        /// Size reported by the API, in bytes
        size: u64,
    },
}

/// Repository metadata returned by `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Repository name
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Optional description
    pub description: Option<String>,
    /// Primary language as reported by the host
    pub language: Option<String>,
    /// Stargazer count
    pub stars: u64,
    /// Fork count
    pub forks: u64,
    /// Browser URL
    pub url: String,
}
