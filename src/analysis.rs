//! Repository analysis: locate, sample, detect, describe and cache.

use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::cache::Cache;
use crate::config::Config;
use crate::diagram::{analysis_summary, render_mermaid};
use crate::error::{ArchaeologistError, Result};
use crate::github::{ContentFetcher, GitHubClient, HostingApi, RepositoryIdentity, RepositoryMetadata};
use crate::stack::{detect, TechStack};
use crate::summarizer::{local_summary, ChatAnswer, SummarizerGateway};
use crate::utils::with_retry_if;
use crate::walker::{BoundedTreeWalker, FetchedFiles, FileFilter, TraversalBudget};

const METADATA_ATTEMPTS: u32 = 3;
const METADATA_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Everything the analysis of one repository produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Repository name as reported by the host
    pub repo_name: String,
    /// Number of files sampled
    pub total_files: usize,
    /// Mermaid `graph TD` source
    pub mermaid_graph: String,
    /// One-line description of the sample
    pub summary: String,
    /// Sampled paths in discovery order
    pub files_analyzed: Vec<String>,
    /// Detected languages, frameworks and tools
    pub tech_stack: TechStack,
    /// Sentence naming the main languages and frameworks
    pub tech_stack_analysis: String,
    /// Prose description of the repository
    pub repo_summary: String,
}

#[derive(Debug, Clone)]
struct CachedRepository {
    files: Arc<FetchedFiles>,
    analysis: Option<AnalysisResult>,
}

/// Orchestrates metadata reads, sampling, detection and summaries
#[derive(Clone)]
pub struct Analyzer {
    api: Arc<dyn HostingApi>,
    walker: BoundedTreeWalker,
    gateway: SummarizerGateway,
    cache: Cache<CachedRepository>,
    budget: TraversalBudget,
    filter: FileFilter,
    ai_summary: bool,
}

impl Analyzer {
    /// Creates an analyzer over `api` and `gateway` with limits from `config`
    pub fn new(api: Arc<dyn HostingApi>, gateway: SummarizerGateway, config: &Config) -> Result<Self> {
        Ok(Self {
            walker: BoundedTreeWalker::new(ContentFetcher::new(api.clone())),
            api,
            gateway,
            cache: Cache::from_config(&config.cache)?,
            budget: config.traversal_budget(),
            filter: config.file_filter(),
            ai_summary: config.summarizer.ai_summary,
        })
    }

    /// Creates an analyzer talking to GitHub and, when a key is set, Gemini
    pub fn from_config(config: &Config) -> Result<Self> {
        let github = GitHubClient::from_config(config)?;
        if !github.is_authenticated() {
            info!("No GitHub token configured; unauthenticated rate limits apply");
        }
        Self::new(Arc::new(github), SummarizerGateway::from_config(config)?, config)
    }

    /// The summarizer gateway answers are produced with
    pub fn gateway(&self) -> &SummarizerGateway {
        &self.gateway
    }

    /// Analyzes the repository behind `url` and caches the result
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        let started = Instant::now();
        let repo = RepositoryIdentity::parse(url)?;
        info!("Analyzing {}", repo);

        let metadata = self.read_metadata(&repo).await?;
        let files = self.walker.walk(&repo, &self.budget, &self.filter).await?;

        let tech_stack = detect(&files);
        let repo_summary = if self.ai_summary {
            self.gateway
                .summarize_repository(&metadata.name, &files, &tech_stack)
                .await
        } else {
            local_summary(&metadata.name, &files, &tech_stack)
        };

        let result = AnalysisResult {
            repo_name: metadata.name,
            total_files: files.len(),
            mermaid_graph: render_mermaid(files.paths()),
            summary: analysis_summary(&files),
            files_analyzed: files.paths().map(str::to_string).collect(),
            tech_stack_analysis: tech_stack.describe(),
            tech_stack,
            repo_summary,
        };

        self.remember(
            &repo.html_url(),
            CachedRepository {
                files: Arc::new(files),
                analysis: Some(result.clone()),
            },
        )
        .await;

        info!("Analysis of {} complete in {:.2?}", repo, started.elapsed());
        Ok(result)
    }

    /// Answers a question about the repository behind `url`
    ///
    /// Reuses the files of a cached analysis; otherwise samples the
    /// repository first and caches the sample.
    pub async fn chat(&self, url: &str, question: &str, context: Option<&str>) -> Result<ChatAnswer> {
        if question.trim().is_empty() {
            return Err(ArchaeologistError::Validation("question must not be empty".into()));
        }
        let repo = RepositoryIdentity::parse(url)?;
        let files = self.files_for(&repo).await?;
        Ok(self.gateway.answer_question(question, &files, context).await)
    }

    /// Metadata of `owner/repo`
    pub async fn metadata(&self, owner: &str, repo: &str) -> Result<RepositoryMetadata> {
        let repo = RepositoryIdentity::parse(&format!("github.com/{}/{}", owner, repo))?;
        self.read_metadata(&repo).await
    }

    /// The cached analysis of `url`, if it is still live
    pub async fn cached_analysis(&self, url: &str) -> Option<AnalysisResult> {
        let repo = RepositoryIdentity::parse(url).ok()?;
        self.cache.get(&repo.html_url()).await?.analysis
    }

    async fn files_for(&self, repo: &RepositoryIdentity) -> Result<Arc<FetchedFiles>> {
        let key = repo.html_url();
        if let Some(cached) = self.cache.get(&key).await {
            info!("Using cached files for {}", repo);
            return Ok(cached.files);
        }

        let files = Arc::new(self.walker.walk(repo, &self.budget, &self.filter).await?);
        self.remember(&key, CachedRepository { files: files.clone(), analysis: None })
            .await;
        Ok(files)
    }

    async fn remember(&self, key: &str, entry: CachedRepository) {
        let expired = self.cache.cleanup_expired().await;
        if expired > 0 {
            debug!("Dropped {} expired analyses", expired);
        }
        self.cache.set(key, entry).await;
        debug!("Cached {} ({} entries)", key, self.cache.len().await);
    }

    async fn read_metadata(&self, repo: &RepositoryIdentity) -> Result<RepositoryMetadata> {
        with_retry_if(
            || self.api.repository_metadata(repo),
            METADATA_ATTEMPTS,
            METADATA_RETRY_DELAY,
            ArchaeologistError::is_transient,
        )
        .await
    }
}
