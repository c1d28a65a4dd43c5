use serde::{Deserialize, Serialize};

/// Environment variable holding the GitHub token
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Stores API keys for the services this tool talks to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// GitHub token; raises the API rate limit but is not required for public repositories
    pub github_token: Option<String>,
    /// Gemini API key used for generating explanations
    pub gemini_api_key: Option<String>,
}

impl ApiKeys {
    /// Reads the keys from the environment, ignoring blank values
    pub fn from_env() -> Self {
        Self {
            github_token: get_env_value(GITHUB_TOKEN_VAR),
            gemini_api_key: get_env_value(GEMINI_API_KEY_VAR),
        }
    }

    /// Fills keys missing here from `other`
    pub fn merge_missing(&mut self, other: ApiKeys) {
        if self.github_token.is_none() {
            self.github_token = other.github_token;
        }
        if self.gemini_api_key.is_none() {
            self.gemini_api_key = other.gemini_api_key;
        }
    }
}

/// Returns the trimmed value of `key`, or `None` when unset or blank
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
