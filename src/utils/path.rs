use crate::error::{ProcessorError, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// What the user asked to explain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoTarget {
    /// A directory on the local filesystem
    Local(PathBuf),
    /// A repository hosted on GitHub
    GitHub {
        /// Repository owner (user or organization)
        owner: String,
        /// Repository name, without a `.git` suffix
        repo: String,
    },
}

impl RepoTarget {
    /// Human-readable label used in CLI output
    pub fn label(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::GitHub { owner, repo } => format!("{}/{}", owner, repo),
        }
    }
}

/// Normalize a user-provided local path string into a PathBuf.
///
/// - Trims leading/trailing whitespace
/// - Strips surrounding single or double quotes if present
/// - Expands a leading '~' to the HOME directory when possible
pub fn normalize_user_input_path(input: &str) -> PathBuf {
    let unquoted = strip_quotes(input.trim());

    if unquoted == "~" || unquoted.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut buf = PathBuf::from(home);
            let rest = unquoted.trim_start_matches('~').trim_start_matches('/');
            if !rest.is_empty() {
                buf.push(rest);
            }
            return buf;
        }
    }

    PathBuf::from(unquoted)
}

fn strip_quotes(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Decides whether the input names an existing local directory or a GitHub repository.
pub fn parse_target(input: &str) -> Result<RepoTarget> {
    let path = normalize_user_input_path(input);
    if !input.trim().is_empty() && path.exists() {
        return Ok(RepoTarget::Local(absolutize(&path)));
    }
    let (owner, repo) = resolve_repo_target(input)?;
    Ok(RepoTarget::GitHub { owner, repo })
}

fn absolutize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolves `owner/repo`, `github.com/owner/repo`, HTTPS URLs and SSH clone URLs
/// into an `(owner, repo)` pair.
pub fn resolve_repo_target(input: &str) -> Result<(String, String)> {
    let mut target = strip_quotes(input.trim()).to_string();

    for (typo, fixed) in [("https//", "https://"), ("http//", "http://")] {
        if let Some(rest) = target.strip_prefix(typo) {
            target = format!("{}{}", fixed, rest);
        }
    }

    if let Some(rest) = target.strip_prefix("git@github.com:") {
        let (owner, repo) = rest
            .split_once('/')
            .ok_or_else(|| ProcessorError::Validation("Invalid GitHub SSH repository URL".into()))?;
        return owner_repo(owner, repo);
    }

    if target.starts_with("github.com/") || target.starts_with("www.github.com/") {
        target = format!("https://{}", target);
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let url = Url::parse(&target)?;
        let host = url.host_str().unwrap_or_default().to_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return Err(ProcessorError::Validation(
                "Only GitHub repository URLs are supported".into(),
            ));
        }
        let parts: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        if parts.len() < 2 {
            return Err(ProcessorError::Validation(
                "URL must point to a repository, not a GitHub page".into(),
            ));
        }
        return owner_repo(parts[0], parts[1]);
    }

    if let Some((owner, repo)) = target.split_once('/') {
        if !repo.contains('/') {
            return owner_repo(owner, repo);
        }
    }

    Err(ProcessorError::Validation(
        "Invalid format. Use owner/repo or a GitHub repo URL".into(),
    ))
}

fn owner_repo(owner: &str, repo: &str) -> Result<(String, String)> {
    let repo = repo.trim_end_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(ProcessorError::Validation(
            "Invalid format. Use owner/repo or a GitHub repo URL".into(),
        ));
    }
    Ok((owner.to_string(), repo.to_string()))
}
