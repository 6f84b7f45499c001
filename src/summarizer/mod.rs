//! Best-effort natural-language generation with deterministic fallbacks.
//!
//! The gateway's public text APIs never fail: a missing backend, a backend
//! error and a timeout all degrade to locally built text.

/// Gemini `generateContent` backend
pub mod gemini;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::config::{Config, SummarizerConfig};
use crate::diagram::extension_counts;
use crate::error::Result;
use crate::stack::TechStack;
use crate::walker::FetchedFiles;

pub use gemini::GeminiClient;

const GENERIC_FALLBACK: &str = "Summary unavailable right now. The repository analysis above is still complete.";
const CHAT_MAX_TOKENS: u32 = 500;
const SUMMARY_MAX_TOKENS: u32 = 400;
const README_EXCERPT_CHARS: usize = 1500;
const SUMMARY_FILE_NAMES: usize = 15;
const SUMMARY_SAMPLES: usize = 3;
const SAMPLE_CHARS: usize = 200;
const RELEVANT_FILES: usize = 5;

/// A generative-language backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for `prompt`, bounding the request by `timeout`
    async fn generate(&self, prompt: &str, max_tokens: u32, timeout: Duration) -> Result<String>;
}

/// Result of one generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Non-blank generated text
    Generated(String),
    /// The backend did not answer within the time limit
    TimedOut,
    /// The backend is missing, failed, or returned blank text
    BackendError(String),
}

/// Answer to a question about a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    /// Generated or fallback answer text, never empty
    pub answer: String,
    /// Paths of the files the answer was drawn from
    pub relevant_files: Vec<String>,
    /// Code excerpts quoted in the answer
    pub code_snippets: Vec<String>,
}

/// Wraps an optional [`TextGenerator`] with timeouts and fallbacks
#[derive(Clone)]
pub struct SummarizerGateway {
    backend: Option<Arc<dyn TextGenerator>>,
    config: SummarizerConfig,
}

impl SummarizerGateway {
    /// Creates a gateway over `backend`; `None` runs in fallback-only mode
    pub fn new(backend: Option<Arc<dyn TextGenerator>>, config: SummarizerConfig) -> Self {
        Self { backend, config }
    }

    /// Creates a gateway backed by Gemini when a key is configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = GeminiClient::from_config(config)?.map(|client| {
            info!("Summaries enabled with model {}", client.model());
            Arc::new(client) as Arc<dyn TextGenerator>
        });
        if backend.is_none() {
            info!("No Gemini API key configured; using local summaries only");
        }
        Ok(Self::new(backend, config.summarizer.clone()))
    }

    /// Whether a backend is configured
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Makes one generation attempt bounded by `limit`
    pub async fn attempt(&self, prompt: &str, max_tokens: u32, limit: Duration) -> GenerationOutcome {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return GenerationOutcome::BackendError("no backend configured".into()),
        };

        match tokio::time::timeout(limit, backend.generate(prompt, max_tokens, limit)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => GenerationOutcome::Generated(text),
            Ok(Ok(_)) => GenerationOutcome::BackendError("backend returned no text".into()),
            Ok(Err(e)) => GenerationOutcome::BackendError(e.to_string()),
            Err(_) => GenerationOutcome::TimedOut,
        }
    }

    /// Generated text for `prompt`, or `fallback`; never fails and never returns empty text
    pub async fn ask(&self, prompt: &str, max_tokens: u32, fallback: &str) -> String {
        self.ask_within(prompt, max_tokens, self.config.chat_timeout(), fallback).await
    }

    async fn ask_within(&self, prompt: &str, max_tokens: u32, limit: Duration, fallback: &str) -> String {
        let fallback = if fallback.trim().is_empty() { GENERIC_FALLBACK } else { fallback };
        match self.attempt(prompt, max_tokens, limit).await {
            GenerationOutcome::Generated(text) => text,
            GenerationOutcome::TimedOut => {
                warn!("Generation timed out after {:?}; using fallback", limit);
                fallback.to_string()
            }
            GenerationOutcome::BackendError(reason) => {
                if self.is_available() {
                    warn!("Generation failed: {}; using fallback", reason);
                }
                fallback.to_string()
            }
        }
    }

    /// Answers `question` over the fetched files
    pub async fn answer_question(&self, question: &str, files: &FetchedFiles, context: Option<&str>) -> ChatAnswer {
        info!("Answering question over {} files", files.len());
        let code = build_code_context(files, self.config.max_context_chars);
        let mut prompt = format!("Answer this question about the code:\n\nCode:\n{}\n\n", code);
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&format!("Additional context: {}\n\n", context));
        }
        prompt.push_str(&format!("Question: {}\n\nProvide a brief, helpful answer.", question));

        match self.attempt(&prompt, CHAT_MAX_TOKENS, self.config.chat_timeout()).await {
            GenerationOutcome::Generated(answer) => ChatAnswer {
                answer,
                relevant_files: files.paths().take(RELEVANT_FILES).map(str::to_string).collect(),
                code_snippets: Vec::new(),
            },
            outcome => {
                if self.is_available() {
                    warn!("Chat generation unavailable ({:?}); answering locally", outcome);
                }
                ChatAnswer {
                    answer: local_answer(files),
                    relevant_files: Vec::new(),
                    code_snippets: Vec::new(),
                }
            }
        }
    }

    /// Multi-line description of what the repository does
    pub async fn summarize_repository(&self, name: &str, files: &FetchedFiles, stack: &TechStack) -> String {
        let readme = files
            .iter()
            .find(|f| f.path.to_lowercase().contains("readme"))
            .map(|f| truncate_chars(&f.content, README_EXCERPT_CHARS))
            .unwrap_or("No README");
        let names: Vec<&str> = files.paths().take(SUMMARY_FILE_NAMES).collect();
        let samples: String = files
            .iter()
            .take(SUMMARY_SAMPLES)
            .map(|f| format!("{}: {}\n\n", f.path, truncate_chars(&f.content, SAMPLE_CHARS)))
            .collect();

        let prompt = format!(
            "Analyze this repository and write a complete summary (10-15 lines).\n\n\
             Repository: {}\n\nREADME:\n{}\n\nFiles: {}\n\nCode samples:\n{}\n\
             Explain what the project is, its main files, its key features and how the parts work together.",
            name,
            readme,
            names.join(", "),
            samples
        );

        let fallback = local_summary(name, files, stack);
        self.ask_within(&prompt, SUMMARY_MAX_TOKENS, self.config.summary_timeout(), &fallback)
            .await
    }
}

/// Concatenates `=== FILE: path ===` blocks, cut to `max_chars` characters
pub fn build_code_context(files: &FetchedFiles, max_chars: usize) -> String {
    let mut context = String::new();
    for file in files.iter() {
        context.push_str(&format!("=== FILE: {} ===\n{}\n\n\n", file.path, file.content));
    }
    truncate_chars(&context, max_chars).to_string()
}

/// Summary built without a backend from file counts and the detected stack
pub fn local_summary(name: &str, files: &FetchedFiles, stack: &TechStack) -> String {
    let types = extension_counts(files)
        .into_iter()
        .take(3)
        .map(|(ext, count)| format!("{} {} files", count, ext))
        .collect::<Vec<_>>()
        .join(", ");
    let languages = if stack.languages.is_empty() {
        "various technologies".to_string()
    } else {
        stack.languages.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
    };
    let kind = stack.frameworks.first().map(String::as_str).unwrap_or("general");

    format!(
        "{} is a software repository containing {} files ({}). The project uses {} and includes \
         components for software development. This codebase appears to be a {} application.",
        name,
        files.len(),
        types,
        languages,
        kind
    )
}

fn local_answer(files: &FetchedFiles) -> String {
    let stack = crate::stack::detect(files);
    let languages = if stack.languages.is_empty() {
        "no recognised language".to_string()
    } else {
        stack.languages.join(", ")
    };
    format!(
        "An AI answer is not available right now. The sampled repository has {} files written in {}; \
         the analysis above describes its structure and stack.",
        files.len(),
        languages
    )
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
