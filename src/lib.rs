#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! Repository Archaeologist - bounded sampling and description of hosted repositories
//!
//! Given a GitHub repository URL, this library walks the repository tree
//! depth-first under a file-count and wall-clock budget, detects the
//! technology stack of the sampled files, renders a small Mermaid diagram and
//! answers questions about the code through an optional generative backend
//! with local fallbacks.
//!
//! ## Usage
//! ```rust,ignore
//! use repo_archaeologist::{analysis::Analyzer, Config};
//!
//! async fn example() -> repo_archaeologist::Result<()> {
//!     let config = Config::load()?;
//!     let analyzer = Analyzer::from_config(&config)?;
//!
//!     let result = analyzer.analyze("https://github.com/rust-lang/log").await?;
//!     println!("{}", result.tech_stack_analysis);
//!     Ok(())
//! }
//! ```

/// Analysis service orchestrating sampling, detection and summaries
pub mod analysis;
/// HTTP router and request/response types
pub mod api;
/// Bounded LRU cache with expiry
pub mod cache;
/// Configuration module for the application
pub mod config;
/// Mermaid diagrams and sample summaries
pub mod diagram;
/// Error handling types and utilities
pub mod error;
/// GitHub URL resolution, REST client and content fetcher
pub mod github;
/// Logging configuration and utilities
pub mod logging;
/// Technology-stack detection
pub mod stack;
/// Generative-language gateway with fallbacks
pub mod summarizer;
/// Retry helpers
pub mod utils;
/// Budgeted repository tree walker
pub mod walker;

// Re-export common types
pub use analysis::{AnalysisResult, Analyzer};
pub use config::Config;
pub use error::{ArchaeologistError, Result};
pub use github::{ContentFetcher, FileContent, GitHubClient, HostingApi, RepositoryIdentity};
pub use stack::TechStack;
pub use summarizer::{ChatAnswer, SummarizerGateway, TextGenerator};
pub use walker::{BoundedTreeWalker, FetchedFiles, FileFilter, TraversalBudget};
