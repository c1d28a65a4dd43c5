#![allow(dead_code)]

use explainthisrepo::config::Config;
use explainthisrepo::utils::RetryPolicy;
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::path::Path;

pub mod test_helpers {
    use super::*;

    pub async fn setup_test_server() -> ServerGuard {
        Server::new_async().await
    }

    /// Config pointing at the mock server, with millisecond backoff so retries stay fast
    pub fn create_test_config(server: &ServerGuard) -> Config {
        Config {
            github_api_base: server.url(),
            request_timeout_secs: 5,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 5,
                max_reset_wait_ms: 3_000,
            },
            ..Config::default()
        }
    }

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    /// Mocks `GET /repos/{owner}/{repo}` with `main` as the default branch
    pub async fn mock_repo(server: &mut ServerGuard, owner: &str, repo: &str) -> Mock {
        server
            .mock("GET", format!("/repos/{}/{}", owner, repo).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"full_name": "{}/{}", "description": "A test repository", "default_branch": "main"}}"#,
                owner, repo
            ))
            .create_async()
            .await
    }

    /// Mocks the recursive tree listing of `main` with blobs of the given sizes
    pub async fn mock_tree(
        server: &mut ServerGuard,
        owner: &str,
        repo: &str,
        blobs: &[(&str, Option<u64>)],
    ) -> Mock {
        let entries: Vec<String> = blobs
            .iter()
            .map(|(path, size)| match size {
                Some(size) => format!(r#"{{"path": "{}", "type": "blob", "size": {}}}"#, path, size),
                None => format!(r#"{{"path": "{}", "type": "blob"}}"#, path),
            })
            .collect();

        server
            .mock("GET", format!("/repos/{}/{}/git/trees/main", owner, repo).as_str())
            .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"tree": [{}], "truncated": false}}"#, entries.join(",")))
            .create_async()
            .await
    }

    /// Mocks the raw content of one file
    pub async fn mock_file(server: &mut ServerGuard, owner: &str, repo: &str, path: &str, body: &str) -> Mock {
        server
            .mock("GET", format!("/repos/{}/{}/contents/{}", owner, repo, path).as_str())
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    pub fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent directory");
        }
        std::fs::write(path, content).expect("failed to write file");
    }
}
