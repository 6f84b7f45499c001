#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mockito::{Mock, ServerGuard};
use repo_archaeologist::config::{ApiKeys, Config};
use serde_json::{json, Value};

pub mod test_helpers {
    use super::*;

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    /// Configuration pointing the GitHub client at a mock server
    pub fn create_test_config(github: &ServerGuard) -> Config {
        let mut config = Config::default();
        config.github_api_base = github.url();
        config.api_keys = ApiKeys { github_token: Some("test-token".into()), gemini_api_key: None };
        config
    }

    /// Adds a Gemini endpoint and key on `gemini` to `config`
    pub fn with_gemini(mut config: Config, gemini: &ServerGuard) -> Config {
        config.gemini_api_base = gemini.url();
        config.gemini_model = "gemini-test".into();
        config.api_keys.gemini_api_key = Some("gemini-key".into());
        config
    }

    fn contents_path(owner: &str, repo: &str, path: &str) -> String {
        if path.is_empty() {
            format!("/repos/{}/{}/contents", owner, repo)
        } else {
            format!("/repos/{}/{}/contents/{}", owner, repo, path)
        }
    }

    /// Mocks a directory listing; `entries` are `(path, type)` pairs
    pub async fn mock_dir(server: &mut ServerGuard, owner: &str, repo: &str, path: &str, entries: &[(&str, &str)]) -> Mock {
        let body: Vec<Value> = entries
            .iter()
            .map(|(p, kind)| {
                json!({
                    "path": p,
                    "name": p.rsplit('/').next().unwrap(),
                    "type": kind,
                    "size": 10,
                })
            })
            .collect();
        server
            .mock("GET", contents_path(owner, repo, path).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(Value::Array(body).to_string())
            .create_async()
            .await
    }

    /// Mocks a single file with base64-encoded content
    pub async fn mock_file(server: &mut ServerGuard, owner: &str, repo: &str, path: &str, content: &str) -> Mock {
        server
            .mock("GET", contents_path(owner, repo, path).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "path": path,
                    "name": path.rsplit('/').next().unwrap(),
                    "type": "file",
                    "size": content.len(),
                    "encoding": "base64",
                    "content": STANDARD.encode(content),
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    /// Mocks `GET /repos/{owner}/{repo}`
    pub async fn mock_repo(server: &mut ServerGuard, owner: &str, repo: &str) -> Mock {
        server
            .mock("GET", format!("/repos/{}/{}", owner, repo).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "name": repo,
                    "full_name": format!("{}/{}", owner, repo),
                    "description": "A sample repository",
                    "language": "Python",
                    "stargazers_count": 42,
                    "forks_count": 7,
                    "html_url": format!("https://github.com/{}/{}", owner, repo),
                })
                .to_string(),
            )
            .create_async()
            .await
    }
}
