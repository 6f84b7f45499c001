//! GitHub access: URL resolution, the REST client and the content fetcher
//! the repository walker reads through.

/// Hosting API trait and its GitHub REST implementation
pub mod client;
/// Directory listings and decoded file reads
pub mod fetcher;
/// Repository URL parsing
pub mod locator;
/// Contents and metadata types
pub mod types;

pub use client::{GitHubClient, HostingApi};
pub use fetcher::{ContentFetcher, FileContent};
pub use locator::RepositoryIdentity;
pub use types::{EntryKind, FileBytes, RepositoryMetadata, TreeEntry};
