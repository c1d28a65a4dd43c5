use explainthisrepo::error::ProcessorError;
use explainthisrepo::github::GitHubClient;
use explainthisrepo::processors::github::GitHubReader;
use explainthisrepo::processors::RepoReader;
use std::io::Write;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

mod common;
use common::test_helpers::*;

#[tokio::test]
async fn test_fetch_repo_metadata() {
    setup_test_logger();
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let mock = mock_repo(&mut server, "rust-lang", "rust").await;

    let client = GitHubClient::new(&config).unwrap();
    let metadata = client.fetch_repo("rust-lang", "rust").await.unwrap();

    assert_eq!(metadata.full_name, "rust-lang/rust");
    assert_eq!(metadata.description.as_deref(), Some("A test repository"));
    assert_eq!(metadata.default_branch, "main");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_waits_for_reset_then_succeeds() {
    setup_test_logger();
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);

    let reset = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 2;
    let limited = server
        .mock("GET", "/repos/owner/repo")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-reset", &reset.to_string())
        .with_body(r#"{"message": "API rate limit exceeded"}"#)
        .expect(1)
        .create_async()
        .await;
    let ok = mock_repo(&mut server, "owner", "repo").await;

    let client = GitHubClient::new(&config).unwrap();
    let started = Instant::now();
    let metadata = client.fetch_repo("owner", "repo").await.unwrap();

    assert_eq!(metadata.full_name, "owner/repo");
    // exponential backoff in the test config is a few milliseconds; only the reset header explains a long wait
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(5));
    limited.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_missing_repository_is_not_retried() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let mock = server
        .mock("GET", "/repos/owner/missing")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    let result = client.fetch_repo("owner", "missing").await;

    assert!(matches!(result, Err(ProcessorError::NotFound(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_fails_immediately() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let mock = server
        .mock("GET", "/repos/owner/repo")
        .with_status(401)
        .with_body(r#"{"message": "Bad credentials"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    match client.fetch_repo("owner", "repo").await {
        Err(ProcessorError::GitHubApi { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Bad credentials");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let mock = server
        .mock("GET", "/repos/owner/repo")
        .with_status(502)
        .expect(3)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    let result = client.fetch_repo("owner", "repo").await;

    assert!(matches!(result, Err(ProcessorError::Network(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_readme_is_none() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let _mock = server
        .mock("GET", "/repos/owner/repo/readme")
        .with_status(404)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    assert_eq!(client.fetch_readme("owner", "repo").await.unwrap(), None);
}

#[tokio::test]
async fn test_readme_is_fetched_raw() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let mock = server
        .mock("GET", "/repos/owner/repo/readme")
        .match_header("accept", "application/vnd.github.v3.raw")
        .with_status(200)
        .with_body("# Project\n")
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    assert_eq!(client.fetch_readme("owner", "repo").await.unwrap().as_deref(), Some("# Project\n"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_languages_sorted_by_bytes() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let _mock = server
        .mock("GET", "/repos/owner/repo/languages")
        .with_status(200)
        .with_body(r#"{"CSS": 300, "TypeScript": 9000, "HTML": 300}"#)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    let languages = client.fetch_languages("owner", "repo").await.unwrap();
    assert_eq!(
        languages,
        vec![
            ("TypeScript".to_string(), 9000),
            ("CSS".to_string(), 300),
            ("HTML".to_string(), 300),
        ]
    );
}

#[tokio::test]
async fn test_reader_skips_vendored_paths() {
    setup_test_logger();
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let _repo = mock_repo(&mut server, "owner", "repo").await;
    let _tree = mock_tree(
        &mut server,
        "owner",
        "repo",
        &[
            ("package.json", Some(120)),
            ("src/index.js", Some(80)),
            ("README.md", Some(40)),
            ("node_modules/x/y.js", Some(10)),
            ("dist/bundle.min.js", Some(10)),
        ],
    )
    .await;
    let _pkg = mock_file(&mut server, "owner", "repo", "package.json", r#"{"name": "demo"}"#).await;
    let _index = mock_file(&mut server, "owner", "repo", "src/index.js", "console.log('hi');").await;

    let client = GitHubClient::new(&config).unwrap();
    let result = GitHubReader::new(client, "owner", "repo").read().await.unwrap();

    assert_eq!(result.selected_files, vec!["package.json", "src/index.js"]);
    assert_eq!(result.tree.len(), 5);
    assert!(result.tree_text.contains("node_modules"));
    assert!(result.files_text.contains("FILE: src/index.js\n```\nconsole.log('hi');\n```"));
    assert_eq!(result.key_files.get("package.json").map(String::as_str), Some(r#"{"name": "demo"}"#));
}

#[tokio::test]
async fn test_reader_omits_files_that_fail_to_fetch() {
    setup_test_logger();
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let _repo = mock_repo(&mut server, "owner", "repo").await;
    let _tree = mock_tree(
        &mut server,
        "owner",
        "repo",
        &[("go.mod", Some(50)), ("cmd/main.go", None)],
    )
    .await;
    let _broken = server
        .mock("GET", "/repos/owner/repo/contents/go.mod")
        .with_status(500)
        .create_async()
        .await;
    let _main = mock_file(&mut server, "owner", "repo", "cmd/main.go", "package main").await;

    let client = GitHubClient::new(&config).unwrap();
    let result = GitHubReader::new(client, "owner", "repo").read().await.unwrap();

    assert_eq!(result.selected_files, vec!["go.mod", "cmd/main.go"]);
    assert!(!result.files_text.contains("FILE: go.mod"));
    assert!(result.files_text.contains("FILE: cmd/main.go"));
    assert!(result.key_files.is_empty());
}

#[tokio::test]
async fn test_reader_fails_when_tree_is_missing() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);
    let _repo = server
        .mock("GET", "/repos/owner/private")
        .with_status(404)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    let result = GitHubReader::new(client, "owner", "private").read().await;
    assert!(matches!(result, Err(ProcessorError::NotFound(_))));
}

#[tokio::test]
async fn test_forbidden_with_quota_left_is_not_a_rate_limit() {
    let mut server = setup_test_server().await;
    let config = create_test_config(&server);

    let reset = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
    let mock = server
        .mock("GET", "/repos/owner/repo")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "4999")
        .with_header("x-ratelimit-reset", &reset.to_string())
        .with_body(r#"{"message": "Resource not accessible by integration"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    let started = Instant::now();
    let result = client.fetch_repo("owner", "repo").await;

    assert!(started.elapsed() < Duration::from_secs(1));
    match result {
        Err(ProcessorError::GitHubApi { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Resource not accessible by integration");
        }
        other => panic!("expected a 403 API error, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stalled_body_times_out_and_is_retried() {
    let mut server = setup_test_server().await;
    let mut config = create_test_config(&server);
    config.request_timeout_secs = 1;

    let _stalled = server
        .mock("GET", "/repos/owner/repo/readme")
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(b"# Partial")?;
            std::thread::sleep(Duration::from_secs(2));
            w.write_all(b" README\n")
        })
        .create_async()
        .await;

    let client = GitHubClient::new(&config).unwrap();
    let started = Instant::now();
    let result = client.fetch_readme("owner", "repo").await;

    match result {
        Err(err @ ProcessorError::Timeout(1)) => assert!(err.is_transient()),
        other => panic!("expected a timeout, got {:?}", other),
    }
    // each attempt spends the full second waiting on the body
    assert!(started.elapsed() >= Duration::from_secs(2));
}
