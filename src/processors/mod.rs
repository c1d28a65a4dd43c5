use async_trait::async_trait;
use crate::config::Config;
use crate::error::Result;
use crate::github::GitHubClient;
use crate::utils::RepoTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Module for reading GitHub repositories through the REST API
pub mod github;
/// Module for common processor utilities
pub mod common;
/// Module for local directory traversal
pub mod local;
/// Module with the signal-file scoring and budgeting tables
pub mod signal;

/// Kind of entry in a tree snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A file
    Blob,
    /// A directory
    Tree,
    /// Anything else the API reports (e.g. submodule commits)
    #[serde(other)]
    Other,
}

/// One filesystem or repository entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    /// Slash-separated path relative to the scan root
    pub path: String,
    /// Whether the entry is a file or a directory
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes, when known
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeItem {
    /// Creates a file entry
    pub fn blob(path: impl Into<String>, size: Option<u64>) -> Self {
        Self { path: path.into(), kind: EntryKind::Blob, size }
    }

    /// Creates a directory entry
    pub fn tree(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::Tree, size: None }
    }

    /// Whether this entry is a file
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// Output of one signal-selection run, handed to the prompt builder or stack detector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoReadResult {
    /// Tree snapshot in traversal order
    pub tree: Vec<TreeItem>,
    /// Bounded, human-readable outline of the tree
    pub tree_text: String,
    /// Concatenated contents of the selected files
    pub files_text: String,
    /// Paths chosen for `files_text`, in selection order
    pub selected_files: Vec<String>,
    /// Manifest contents keyed by path, consumed by the stack detector
    pub key_files: BTreeMap<String, String>,
}

impl RepoReadResult {
    /// Content of the first README found among the key files
    pub fn readme(&self) -> Option<&str> {
        self.key_files
            .iter()
            .find(|(path, _)| path.to_lowercase().starts_with("readme"))
            .map(|(_, content)| content.as_str())
    }
}

/// Produces a tree snapshot and key files for one repository root
#[async_trait]
pub trait RepoReader: Send + Sync {
    /// Returns the name of the reader
    fn name(&self) -> &'static str;
    /// Reads the tree, selects signal files and returns the digest
    async fn read(&self) -> Result<RepoReadResult>;
}

/// Creates the reader matching a resolved target
pub fn create_reader(target: &RepoTarget, config: &Config) -> Result<Box<dyn RepoReader>> {
    match target {
        RepoTarget::Local(path) => Ok(Box::new(local::LocalReader::new(path.clone()))),
        RepoTarget::GitHub { owner, repo } => {
            let client = GitHubClient::new(config)?;
            Ok(Box::new(github::GitHubReader::new(client, owner, repo)))
        }
    }
}
