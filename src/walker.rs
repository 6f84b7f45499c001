//! Bounded depth-first sampling of a hosted repository.
//!
//! A walk visits directories in pre-order, in the order the hosting API lists
//! them, and stops descending as soon as either the file budget or the
//! wall-clock budget is spent. The time check is cooperative: an in-flight
//! listing or read is never interrupted, so the walk can overshoot
//! `max_elapsed` by at most one call.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use async_recursion::async_recursion;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use crate::error::{ArchaeologistError, Result};
use crate::github::{ContentFetcher, EntryKind, FileContent, RepositoryIdentity, TreeEntry};

/// Combined file-count and wall-clock ceiling for one walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalBudget {
    /// Maximum number of files collected
    pub max_files: usize,
    /// Maximum wall-clock time spent walking
    pub max_elapsed: Duration,
}

impl TraversalBudget {
    /// Creates a budget
    pub fn new(max_files: usize, max_elapsed: Duration) -> Self {
        Self { max_files, max_elapsed }
    }
}

/// Mutable counters of a single walk; never shared between walks
#[derive(Debug)]
struct TraversalState {
    files_collected: usize,
    started_at: Instant,
    visited_dirs: HashSet<String>,
    timed_out: bool,
}

impl TraversalState {
    fn start() -> Self {
        Self {
            files_collected: 0,
            started_at: Instant::now(),
            visited_dirs: HashSet::new(),
            timed_out: false,
        }
    }

    fn exhausted(&mut self, budget: &TraversalBudget) -> bool {
        if self.started_at.elapsed() > budget.max_elapsed {
            if !self.timed_out {
                warn!("Repository walk time budget reached ({:?})", budget.max_elapsed);
                self.timed_out = true;
            }
            return true;
        }
        self.files_collected >= budget.max_files
    }
}

/// Decides which directories are descended into and which files are fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    extensions: Vec<String>,
    special_files: Vec<String>,
    manifests: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl FileFilter {
    /// Creates a filter
    ///
    /// * `extensions` - path suffixes that make a file eligible (e.g. `.py`)
    /// * `special_files` - lowercase basename prefixes eligible regardless of extension
    /// * `excluded_dirs` - directory path prefixes that are never listed
    pub fn new(extensions: Vec<String>, special_files: Vec<String>, excluded_dirs: Vec<String>) -> Self {
        Self {
            extensions,
            special_files: special_files.into_iter().map(|s| s.to_lowercase()).collect(),
            manifests: Vec::new(),
            excluded_dirs,
        }
    }

    /// Also accepts files whose lowercase basename equals one of `manifests`
    pub fn with_manifests(mut self, manifests: Vec<String>) -> Self {
        self.manifests = manifests.into_iter().map(|s| s.to_lowercase()).collect();
        self
    }

    /// Whether a directory path starts with one of the excluded prefixes
    pub fn is_excluded_dir(&self, path: &str) -> bool {
        self.excluded_dirs.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Whether a file entry should be fetched
    pub fn is_eligible_file(&self, entry: &TreeEntry) -> bool {
        if entry.kind != EntryKind::File {
            return false;
        }
        let by_extension = self.extensions.iter().any(|ext| entry.path.ends_with(ext.as_str()));
        let name = entry.name.to_lowercase();
        by_extension
            || self.special_files.iter().any(|special| name.starts_with(special.as_str()))
            || self.manifests.iter().any(|manifest| *manifest == name)
    }
}

/// A file collected by a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFile {
    /// Path within the repository
    pub path: String,
    /// Decoded, non-empty text
    pub content: String,
}

/// Files keyed by path in discovery order; the first insert of a path wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FetchedFile>", into = "Vec<FetchedFile>")]
pub struct FetchedFiles {
    files: Vec<FetchedFile>,
    index: HashSet<String>,
}

impl From<Vec<FetchedFile>> for FetchedFiles {
    fn from(files: Vec<FetchedFile>) -> Self {
        files.into_iter().map(|f| (f.path, f.content)).collect()
    }
}

impl From<FetchedFiles> for Vec<FetchedFile> {
    fn from(files: FetchedFiles) -> Self {
        files.files
    }
}

impl FetchedFiles {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file; returns `false` and keeps the existing entry when the path is taken
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.index.insert(path.clone());
        self.files.push(FetchedFile { path, content: content.into() });
        true
    }

    /// Whether a path is present
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains(path)
    }

    /// Content stored for `path`
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.iter().find(|f| f.path == path).map(|f| f.content.as_str())
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file was collected
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &FetchedFile> {
        self.files.iter()
    }

    /// Paths in discovery order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

impl FromIterator<(String, String)> for FetchedFiles {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut files = Self::new();
        for (path, content) in iter {
            files.insert(path, content);
        }
        files
    }
}

/// Walks a repository tree through a [`ContentFetcher`] under a [`TraversalBudget`]
#[derive(Clone)]
pub struct BoundedTreeWalker {
    fetcher: ContentFetcher,
}

impl BoundedTreeWalker {
    /// Creates a walker reading through `fetcher`
    pub fn new(fetcher: ContentFetcher) -> Self {
        Self { fetcher }
    }

    /// Collects a sample of the repository's files
    ///
    /// Fails with `RepositoryFetchFailed` when the root listing fails or when
    /// nothing was collected. A failing subdirectory is skipped, so any
    /// non-empty result is returned even if parts of the tree were unreachable.
    pub async fn walk(
        &self,
        repo: &RepositoryIdentity,
        budget: &TraversalBudget,
        filter: &FileFilter,
    ) -> Result<FetchedFiles> {
        let mut state = TraversalState::start();
        let mut files = FetchedFiles::new();

        if let Err(e) = self.walk_directory(repo, "", budget, filter, &mut state, &mut files).await {
            return Err(ArchaeologistError::fetch_failed(
                format!("could not list the root of {}", repo),
                Some(e),
            ));
        }

        info!(
            "Walked {}: {} files in {:.2?}{}",
            repo,
            files.len(),
            state.started_at.elapsed(),
            if state.timed_out { " (time budget reached)" } else { "" }
        );

        if files.is_empty() {
            return Err(ArchaeologistError::fetch_failed(
                format!("no files found in {} with the configured extensions", repo),
                None,
            ));
        }
        Ok(files)
    }

    /// Lists `path` and handles its children; only the listing of `path` itself can fail
    #[async_recursion]
    async fn walk_directory(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        budget: &TraversalBudget,
        filter: &FileFilter,
        state: &mut TraversalState,
        files: &mut FetchedFiles,
    ) -> Result<()> {
        if state.exhausted(budget) {
            return Ok(());
        }
        if !state.visited_dirs.insert(path.to_string()) {
            debug!("Directory {} already visited", path);
            return Ok(());
        }

        let entries = self.fetcher.list_directory(repo, path).await?;

        for entry in entries {
            if state.exhausted(budget) {
                break;
            }

            match entry.kind {
                EntryKind::Directory => {
                    if filter.is_excluded_dir(&entry.path) {
                        debug!("Skipping directory {}", entry.path);
                        continue;
                    }
                    if let Err(e) = self
                        .walk_directory(repo, &entry.path, budget, filter, state, files)
                        .await
                    {
                        warn!("Error traversing directory {}: {}", entry.path, e);
                    }
                }
                EntryKind::File if filter.is_eligible_file(&entry) => {
                    if files.contains(&entry.path) {
                        continue;
                    }
                    match self.fetcher.read_file(repo, &entry.path).await {
                        FileContent::Text(text) if !text.is_empty() => {
                            if files.insert(entry.path, text) {
                                state.files_collected += 1;
                            }
                        }
                        FileContent::Text(_) | FileContent::Empty => {
                            debug!("Skipping empty file {}", entry.path);
                        }
                        FileContent::Unreadable(reason) => {
                            debug!("Skipping unreadable file {}: {}", entry.path, reason);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}
