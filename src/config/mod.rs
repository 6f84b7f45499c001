mod env_manager;

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{ArchaeologistError, Result};
use crate::walker::{FileFilter, TraversalBudget};

pub use env_manager::ApiKeys;

const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Main configuration struct for the application
///
/// Holds API credentials, hosting and generative endpoints, the traversal
/// budget and filters, summarizer timeouts and result-cache bounds. Every
/// section has defaults, so a partial TOML file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API keys for the hosting and generative services
    pub api_keys: ApiKeys,
    /// Base URL of the GitHub REST API
    pub github_api_base: String,
    /// Base URL of the Gemini REST API
    pub gemini_api_base: String,
    /// Gemini model used for answers and summaries
    pub gemini_model: String,
    /// Per-request timeout for hosting API calls, in seconds
    pub http_timeout_secs: u64,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Repository traversal settings
    pub traversal: TraversalConfig,
    /// Generative-language settings
    pub summarizer: SummarizerConfig,
    /// Result cache settings
    pub cache: CacheConfig,
}

/// Budget and filters for one repository walk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Maximum number of files collected per walk
    pub max_files: usize,
    /// Wall-clock budget for one walk, in milliseconds
    pub walk_timeout_ms: u64,
    /// File suffixes that make a file eligible
    pub extensions: Vec<String>,
    /// Lowercase basename prefixes eligible regardless of extension
    pub special_files: Vec<String>,
    /// Exact manifest names (case-insensitive) read for stack detection
    pub manifests: Vec<String>,
    /// Directory path prefixes that are never descended into
    pub excluded_dirs: Vec<String>,
}

/// Timeouts and limits for the generative-language backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Timeout for question answering, in seconds
    pub chat_timeout_secs: u64,
    /// Timeout for repository summaries, in seconds
    pub summary_timeout_secs: u64,
    /// Maximum number of characters of code sent as chat context
    pub max_context_chars: usize,
    /// Ask the backend for a prose repository summary during analysis
    pub ai_summary: bool,
}

/// Bounds for the in-memory result cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of analyzed repositories kept
    pub capacity: usize,
    /// How long an analysis stays valid, in seconds
    pub ttl_secs: u64,
}

impl Config {
    /// Loads configuration from the default config file location, then applies
    /// environment overrides
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let mut config = match dirs::config_dir() {
            Some(dir) => {
                let path = dir.join("repo-archaeologist").join("config.toml");
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ArchaeologistError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ArchaeologistError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Applies overrides from an environment-like lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        self.api_keys.merge(ApiKeys::from_lookup(&lookup));
        if let Some(base) = value("GITHUB_API_BASE_URL") {
            self.github_api_base = base;
        }
        if let Some(base) = value("GEMINI_API_BASE_URL") {
            self.gemini_api_base = base;
        }
        if let Some(model) = value("GEMINI_MODEL") {
            self.gemini_model = model;
        }
        if let Some(bind) = value("ARCHAEOLOGIST_BIND") {
            self.bind_address = bind;
        }
        if let Some(max_files) = value("ARCHAEOLOGIST_MAX_FILES").and_then(|v| v.parse().ok()) {
            self.traversal.max_files = max_files;
        }
        if let Some(ms) = value("ARCHAEOLOGIST_WALK_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.traversal.walk_timeout_ms = ms;
        }
    }

    /// Validates limits and endpoints
    pub fn validate(&self) -> Result<()> {
        if self.traversal.max_files == 0 {
            return Err(ArchaeologistError::Config("traversal.max_files must be at least 1".into()));
        }
        if self.traversal.walk_timeout_ms == 0 {
            return Err(ArchaeologistError::Config("traversal.walk_timeout_ms must be positive".into()));
        }
        if self.cache.capacity == 0 {
            return Err(ArchaeologistError::Config("cache.capacity must be at least 1".into()));
        }
        for base in [&self.github_api_base, &self.gemini_api_base] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ArchaeologistError::Config(format!("Not an HTTP endpoint: {}", base)));
            }
        }
        Ok(())
    }

    /// Traversal budget derived from the traversal section
    pub fn traversal_budget(&self) -> TraversalBudget {
        TraversalBudget::new(
            self.traversal.max_files,
            Duration::from_millis(self.traversal.walk_timeout_ms),
        )
    }

    /// File filter derived from the traversal section
    pub fn file_filter(&self) -> FileFilter {
        FileFilter::new(
            self.traversal.extensions.clone(),
            self.traversal.special_files.clone(),
            self.traversal.excluded_dirs.clone(),
        )
        .with_manifests(self.traversal.manifests.clone())
    }

    /// Timeout applied to hosting API requests
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl SummarizerConfig {
    /// Time limit for question answering
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    /// Time limit for repository summaries
    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }
}

impl CacheConfig {
    /// Lifetime of a cached analysis
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_files: 50,
            walk_timeout_ms: 5_000,
            extensions: [
                ".py", ".js", ".ts", ".tsx", ".jsx",
                ".java", ".go", ".rs", ".cpp", ".c", ".h",
                ".css", ".html", ".md", ".json", ".yml", ".yaml",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            special_files: ["readme", "license", "dockerfile", "makefile"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            manifests: [
                "requirements.txt", "requirements.in", "pyproject.toml",
                "cargo.toml", "go.mod", "pom.xml", "build.gradle", "build.gradle.kts",
                "docker-compose.yml", "docker-compose.yaml",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_dirs: ["node_modules", "venv", ".git", "dist", "build", "__pycache__", "test", "docs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chat_timeout_secs: 8,
            summary_timeout_secs: 10,
            max_context_chars: 15_000,
            ai_summary: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            ttl_secs: 3600, // 1 hour
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            github_api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            http_timeout_secs: 30,
            bind_address: "127.0.0.1:8000".to_string(),
            traversal: TraversalConfig::default(),
            summarizer: SummarizerConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}
