use crate::config::{get_env_value, Config, GEMINI_API_KEY_VAR, GITHUB_TOKEN_VAR};
use crate::processors::common::create_progress_bar;
use colored::*;
use reqwest::Client;
use std::fmt::Write;
use std::time::Duration;
use url::Url;

const CHECK_TIMEOUT_SECS: u64 = 6;

/// Outcome of one network probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// What was probed
    pub name: &'static str,
    /// The probed URL
    pub url: String,
    /// Whether the host answered at all
    pub reachable: bool,
    /// Status line or failure reason
    pub detail: String,
}

/// Everything `--doctor` reports
#[derive(Debug, Clone)]
pub struct DoctorReport {
    /// Crate version
    pub version: &'static str,
    /// Operating system and architecture
    pub platform: String,
    /// Whether `GEMINI_API_KEY` is available
    pub gemini_key_set: bool,
    /// Whether `GITHUB_TOKEN` is available
    pub github_token_set: bool,
    /// Network probes
    pub checks: Vec<Check>,
}

impl DoctorReport {
    /// Process exit code: 0 when every endpoint answered
    pub fn exit_code(&self) -> i32 {
        if self.checks.iter().all(|c| c.reachable) {
            0
        } else {
            1
        }
    }

    /// Plain-text report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}\n", "explainthisrepo doctor report".bold());
        let _ = writeln!(out, "version: {}", self.version);
        let _ = writeln!(out, "platform: {}", self.platform);

        let _ = writeln!(out, "\nenvironment:");
        let _ = writeln!(out, "- {} set: {}", GEMINI_API_KEY_VAR, self.gemini_key_set);
        let _ = writeln!(out, "- {} set: {}", GITHUB_TOKEN_VAR, self.github_token_set);

        let _ = writeln!(out, "\nnetwork checks:");
        for check in &self.checks {
            let status = if check.reachable {
                check.detail.green()
            } else {
                check.detail.red()
            };
            let _ = writeln!(out, "- {} ({}): {}", check.name, check.url, status);
        }
        out
    }
}

/// Probes `url` once; any HTTP response counts as reachable
pub async fn check_url(client: &Client, name: &'static str, url: &str) -> Check {
    let (reachable, detail) = match client.get(url).send().await {
        Ok(response) => (true, format!("ok ({})", response.status().as_u16())),
        Err(e) if e.is_timeout() => (false, format!("failed (timed out after {}s)", CHECK_TIMEOUT_SECS)),
        Err(e) => (false, format!("failed ({})", e)),
    };
    Check { name, url: url.to_string(), reachable, detail }
}

fn gemini_root(base: &str) -> String {
    Url::parse(base)
        .and_then(|url| url.join("/"))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| base.to_string())
}

/// Gathers environment facts and probes the GitHub and Gemini endpoints
pub async fn collect(config: &Config) -> DoctorReport {
    let client = Client::builder()
        .timeout(Duration::from_secs(CHECK_TIMEOUT_SECS))
        .user_agent("explainthisrepo")
        .build()
        .unwrap_or_else(|_| Client::new());

    let github = check_url(&client, "github api", &config.github_api_base).await;
    let gemini = check_url(&client, "gemini endpoint", &gemini_root(&config.gemini_api_base)).await;

    DoctorReport {
        version: env!("CARGO_PKG_VERSION"),
        platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        gemini_key_set: config.api_keys.gemini_api_key.is_some()
            || get_env_value(GEMINI_API_KEY_VAR).is_some(),
        github_token_set: config.api_keys.github_token.is_some()
            || get_env_value(GITHUB_TOKEN_VAR).is_some(),
        checks: vec![github, gemini],
    }
}

/// Runs the diagnostics, prints the report and returns the exit code
pub async fn run_doctor(config: &Config) -> i32 {
    let pb = create_progress_bar("Running diagnostics...");
    let report = collect(config).await;
    pb.finish_and_clear();

    print!("{}", report.render());
    report.exit_code()
}
