use serde::{Deserialize, Serialize};

/// Stores API keys for the hosting and generative-language services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub API token for authenticated requests (higher rate limits)
    pub github_token: Option<String>,
    /// Gemini API key; without it every generative call falls back to local text
    pub gemini_api_key: Option<String>,
}

impl ApiKeys {
    /// Loads API keys through an arbitrary lookup, treating blank values as absent
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            github_token: non_blank(lookup("GITHUB_TOKEN")),
            gemini_api_key: non_blank(lookup("GEMINI_API_KEY")),
        }
    }

    /// Keys present in `other` replace the ones held here; blank keys left
    /// over from a config file are dropped
    pub fn merge(&mut self, other: ApiKeys) {
        if other.github_token.is_some() {
            self.github_token = other.github_token;
        }
        if other.gemini_api_key.is_some() {
            self.gemini_api_key = other.gemini_api_key;
        }
        self.github_token = non_blank(self.github_token.take());
        self.gemini_api_key = non_blank(self.gemini_api_key.take());
    }
}


fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
