use crate::error::Result;
use crate::github::GitHubClient;
use crate::processors::signal::{
    build_tree_summary, format_file_block, sanitize_text, select_files, truncate_chars,
    SelectionBudget, STACK_KEY_FILES, STACK_KEY_FILE_CHARS,
};
use crate::processors::{RepoReadResult, RepoReader, TreeItem};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Reads a GitHub repository: one tree listing, then sequential fetches of the best files
pub struct GitHubReader {
    client: GitHubClient,
    owner: String,
    repo: String,
    branch: Option<String>,
    budget: SelectionBudget,
}

impl GitHubReader {
    /// Creates a reader for `owner/repo` with the default selection budget
    pub fn new(client: GitHubClient, owner: &str, repo: &str) -> Self {
        Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: None,
            budget: SelectionBudget::DEFAULT,
        }
    }

    /// Reads `branch` instead of looking up the default branch again
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    /// Replaces the selection budget
    pub fn with_budget(mut self, budget: SelectionBudget) -> Self {
        self.budget = budget;
        self
    }

    async fn fetch_selected(&self, paths: &[String]) -> String {
        let mut blocks = Vec::with_capacity(paths.len());
        for path in paths {
            match self.client.fetch_file(&self.owner, &self.repo, path).await {
                Ok(content) => {
                    let content = sanitize_text(&truncate_chars(&content, self.budget.max_file_chars));
                    blocks.push(format_file_block(path, &content));
                }
                Err(e) => warn!("Skipping {}: {}", path, e),
            }
        }
        blocks.join("\n")
    }

    async fn probe_key_files(&self, tree: &[TreeItem]) -> BTreeMap<String, String> {
        let mut key_files = BTreeMap::new();
        for name in STACK_KEY_FILES {
            let Some(item) = tree
                .iter()
                .find(|item| item.is_blob() && item.path.eq_ignore_ascii_case(name))
            else {
                continue;
            };

            match self.client.fetch_file(&self.owner, &self.repo, &item.path).await {
                Ok(content) => {
                    let content = sanitize_text(&truncate_chars(&content, STACK_KEY_FILE_CHARS));
                    key_files.insert(name.to_string(), content);
                }
                Err(e) => warn!("Could not read key file {}: {}", item.path, e),
            }
        }
        key_files
    }
}

#[async_trait]
impl RepoReader for GitHubReader {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn read(&self) -> Result<RepoReadResult> {
        let tree = match &self.branch {
            Some(branch) => self.client.fetch_tree_at(&self.owner, &self.repo, branch).await?,
            None => self.client.fetch_tree(&self.owner, &self.repo).await?,
        };

        let selected: Vec<String> = select_files(&tree, &self.budget)
            .into_iter()
            .map(|file| file.path)
            .collect();
        debug!("Selected {} signal files from {}/{}", selected.len(), self.owner, self.repo);

        let files_text = self.fetch_selected(&selected).await;
        let key_files = self.probe_key_files(&tree).await;
        info!(
            "Read {} files and {} key files from {}/{}",
            selected.len(),
            key_files.len(),
            self.owner,
            self.repo
        );

        Ok(RepoReadResult {
            tree_text: sanitize_text(&build_tree_summary(&tree)),
            tree,
            files_text,
            selected_files: selected,
            key_files,
        })
    }
}
