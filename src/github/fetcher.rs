use std::sync::Arc;
use log::warn;
use crate::error::Result;
use super::client::HostingApi;
use super::locator::RepositoryIdentity;
use super::types::{FileBytes, TreeEntry};

/// Outcome of reading one file
///
/// `Empty` and `Unreadable` are kept apart so that callers can tell a
/// genuinely empty file from one the host could not give back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Decoded text
    Text(String),
    /// The file exists and has no bytes
    Empty,
    /// The content could not be retrieved; the reason is for logs only
    Unreadable(String),
}

/// Retrieves directory listings and decoded file contents from a hosting API
#[derive(Clone)]
pub struct ContentFetcher {
    api: Arc<dyn HostingApi>,
}

impl ContentFetcher {
    /// Wraps a hosting API implementation
    pub fn new(api: Arc<dyn HostingApi>) -> Self {
        Self { api }
    }

    /// Lists the immediate children of `path`, propagating hosting failures
    pub async fn list_directory(&self, repo: &RepositoryIdentity, path: &str) -> Result<Vec<TreeEntry>> {
        self.api.list_directory(repo, path).await
    }

    /// Reads and decodes one file
    ///
    /// Never fails: multi-part or oversized payloads and request errors yield
    /// [`FileContent::Unreadable`], and invalid UTF-8 sequences are replaced.
    pub async fn read_file(&self, repo: &RepositoryIdentity, path: &str) -> FileContent {
        match self.api.get_file_bytes(repo, path).await {
            Ok(FileBytes::Blob(bytes)) if bytes.is_empty() => FileContent::Empty,
            Ok(FileBytes::Blob(bytes)) => FileContent::Text(decode_text(bytes)),
            Ok(FileBytes::Parts(count)) => {
                FileContent::Unreadable(format!("returned as a list of {} parts", count))
            }
            Ok(FileBytes::TooLarge { size }) => {
                FileContent::Unreadable(format!("{} bytes, content not inlined", size))
            }
            Err(e) => {
                warn!("Error reading file {}: {}", path, e);
                FileContent::Unreadable(e.to_string())
            }
        }
    }
}

fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
