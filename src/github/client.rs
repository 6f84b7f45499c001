use std::time::Duration;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::{header, Client, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use crate::config::Config;
use crate::error::{ArchaeologistError, Result};
use super::locator::RepositoryIdentity;
use super::types::{EntryKind, FileBytes, RepositoryMetadata, TreeEntry};

const USER_AGENT: &str = "repo-archaeologist";

/// Capability the fetcher needs from a code-hosting service
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Lists the immediate children of `path` (`""` is the repository root)
    async fn list_directory(&self, repo: &RepositoryIdentity, path: &str) -> Result<Vec<TreeEntry>>;

    /// Retrieves the raw content of one file
    async fn get_file_bytes(&self, repo: &RepositoryIdentity, path: &str) -> Result<FileBytes>;

    /// Retrieves repository metadata
    async fn repository_metadata(&self, repo: &RepositoryIdentity) -> Result<RepositoryMetadata>;
}

#[derive(Deserialize)]
struct ContentItem {
    path: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    html_url: String,
}

/// GitHub REST v3 implementation of [`HostingApi`]
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Creates a client against `base_url`, authenticating when a token is given
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Creates a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.github_api_base.clone(),
            config.api_keys.github_token.clone(),
            config.http_timeout(),
        )
    }

    /// Whether requests carry a bearer token
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, repo: &RepositoryIdentity, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ArchaeologistError::Config(format!("Invalid GitHub API base URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ArchaeologistError::Config("GitHub API base URL cannot be a base".into()))?;
            segments.pop_if_empty().extend(["repos", repo.owner.as_str(), repo.name.as_str()]);
            segments.extend(tail.iter().filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn contents_url(&self, repo: &RepositoryIdentity, path: &str) -> Result<Url> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/'));
        self.endpoint(repo, &tail)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(ArchaeologistError::HostingApi {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn list_directory(&self, repo: &RepositoryIdentity, path: &str) -> Result<Vec<TreeEntry>> {
        let value = self.get_json(self.contents_url(repo, path)?).await?;
        let Value::Array(_) = value else {
            return Err(ArchaeologistError::Decode(format!("{} is not a directory", path)));
        };

        let items: Vec<ContentItem> = serde_json::from_value(value)?;
        Ok(items
            .into_iter()
            .map(|item| TreeEntry {
                kind: EntryKind::from_api(&item.kind),
                path: item.path,
                name: item.name,
            })
            .collect())
    }

    async fn get_file_bytes(&self, repo: &RepositoryIdentity, path: &str) -> Result<FileBytes> {
        let value = self.get_json(self.contents_url(repo, path)?).await?;
        if let Value::Array(parts) = &value {
            return Ok(FileBytes::Parts(parts.len()));
        }

        let item: ContentItem = serde_json::from_value(value)?;
        match (item.encoding.as_deref(), item.content) {
            (Some("base64"), Some(content)) => {
                let compact: String = content.split_whitespace().collect();
                STANDARD
                    .decode(compact.as_bytes())
                    .map(FileBytes::Blob)
                    .map_err(|e| ArchaeologistError::Decode(format!("{}: {}", path, e)))
            }
            (_, Some(content)) if !content.is_empty() => Ok(FileBytes::Blob(content.into_bytes())),
            _ if item.size > 0 => Ok(FileBytes::TooLarge { size: item.size }),
            _ => Ok(FileBytes::Blob(Vec::new())),
        }
    }

    async fn repository_metadata(&self, repo: &RepositoryIdentity) -> Result<RepositoryMetadata> {
        let value = self.get_json(self.endpoint(repo, &[])?).await?;
        let info: RepoResponse = serde_json::from_value(value)?;

        Ok(RepositoryMetadata {
            name: info.name,
            full_name: info.full_name,
            description: info.description,
            language: info.language,
            stars: info.stargazers_count,
            forks: info.forks_count,
            url: info.html_url,
        })
    }
}
