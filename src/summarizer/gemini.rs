use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::Config;
use crate::error::{ArchaeologistError, Result};
use super::TextGenerator;

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Creates a client for `model` at `base_url`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ArchaeologistError::Config("Gemini API key is empty".into()));
        }
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Creates a client when the configuration carries a non-blank Gemini key
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let key = config
            .api_keys
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());
        match key {
            Some(key) => Ok(Some(Self::new(
                config.gemini_api_base.clone(),
                config.gemini_model.clone(),
                key,
            )?)),
            None => Ok(None),
        }
    }

    /// Model identifier requests are sent to
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32, timeout: Duration) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: max_tokens,
            },
        };

        debug!("Sending {} prompt chars to {}", prompt.len(), self.model);
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(ArchaeologistError::SummarizationUnavailable(format!(
                "Gemini API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        let generated: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(generated.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PATH: &str = r"^/v1beta/models/gemini-test:generateContent";

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        GeminiClient::new(server.url(), "gemini-test", "secret").unwrap()
    }

    #[tokio::test]
    async fn test_generate_joins_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(PATH.into()))
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [{"text": "hello"}]}],
                "generationConfig": {"maxOutputTokens": 64}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [{"text": "Hi "}, {"text": "there\n"}]}}]}).to_string(),
            )
            .create_async()
            .await;

        let text = client_for(&server)
            .generate("hello", 64, Duration::from_secs(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(PATH.into()))
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(json!({"error": {"code": 429, "message": "Quota exceeded"}}).to_string())
            .create_async()
            .await;

        let error = client_for(&server)
            .generate("hello", 64, Duration::from_secs(5))
            .await
            .unwrap_err();

        match error {
            ArchaeologistError::SummarizationUnavailable(message) => {
                assert!(message.contains("429"));
                assert!(message.contains("Quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_yields_empty_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(PATH.into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let text = client_for(&server)
            .generate("hello", 64, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(matches!(
            GeminiClient::new("http://localhost", "m", "  "),
            Err(ArchaeologistError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_treats_blank_key_as_missing() {
        let mut config = Config::default();
        config.api_keys.gemini_api_key = Some(String::new());
        assert!(GeminiClient::from_config(&config).unwrap().is_none());

        config.api_keys.gemini_api_key = Some(" key ".into());
        let client = GeminiClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.api_key, "key");
    }
}
