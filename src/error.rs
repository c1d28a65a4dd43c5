use std::io;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Errors that can occur while reading a repository or generating an explanation
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The repository or path does not exist, or is not accessible
    #[error("Not found: {0}")]
    NotFound(String),

    /// API rate limit exceeded; `reset_at` is the epoch second the limit resets, when known
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Description of the rejected request
        message: String,
        /// Epoch seconds at which the limit resets
        reset_at: Option<u64>,
    },

    /// Connection failures and 5xx responses
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Non-retryable GitHub API responses (401, 400, 422, ...)
    #[error("GitHub API error ({status}): {message}")]
    GitHubApi {
        /// HTTP status code
        status: u16,
        /// Message returned by the API
        message: String,
    },

    /// Malformed response bodies
    #[error("Parsing error: {0}")]
    Parse(String),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Directory traversal errors
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Language model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// General message errors
    #[error("{0}")]
    Message(String),
}

impl ProcessorError {
    /// Creates a new error with the specified message
    pub fn new(message: &str) -> Self {
        Self::Message(message.to_string())
    }

    /// Classifies a transport-level failure so raw reqwest errors never reach the user
    pub fn from_transport(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_connect() {
            Self::Network("could not connect to the remote host".to_string())
        } else if err.is_decode() {
            Self::Parse("could not decode the response body".to_string())
        } else if err.is_body() {
            Self::Network("the response body was cut off".to_string())
        } else {
            Self::Network("the connection failed before a response arrived".to_string())
        }
    }

    /// Checks if this error is transient and retryable
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimitExceeded { .. }
        )
    }

    /// Checks if this error is fatal and should terminate processing
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }

    /// Remediation hints printed under the error message by the CLI
    pub fn hint(&self) -> &'static [&'static str] {
        match self {
            Self::NotFound(_) => &[
                "Check the owner/repo spelling",
                "Ensure the repository exists and is public, or set GITHUB_TOKEN",
            ],
            Self::RateLimitExceeded { .. } => &["Set GITHUB_TOKEN to raise the GitHub API rate limit"],
            Self::Network(_) | Self::Timeout(_) => &[
                "Check your network connection and try again",
                "Or run: explainthisrepo --doctor",
            ],
            Self::GitHubApi { status: 401, .. } => &["Check that GITHUB_TOKEN is valid"],
            Self::GitHubApi { status: 403, .. } => &[
                "Check that GITHUB_TOKEN has access to this repository",
                "Tokens for SSO organizations must be authorized for that organization",
            ],
            Self::Llm(_) | Self::Config(_) => &[
                "Ensure GEMINI_API_KEY is set",
                "Or run: explainthisrepo --doctor",
            ],
            Self::Validation(_) => &["Use owner/repo, a GitHub repository URL, or a local path"],
            _ => &[],
        }
    }
}
